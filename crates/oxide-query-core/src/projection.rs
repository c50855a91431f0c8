//! Projection lists.
//!
//! A projection maps field names to `1` (include) or `0` (exclude). Fields
//! other than `id` are selected only when mapped to `1`; `id` is selected
//! whenever it is listed and not mapped to `0`.

use serde_json::Value;

use crate::error::{QueryError, Result};

const ID_FIELD: &str = "id";

/// An ordered field projection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection {
    /// `None` marks a flag that is neither an integer nor `0.0`/`1.0`.
    fields: Vec<(String, Option<i64>)>,
}

impl Projection {
    /// Creates an empty projection.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field with its flag.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, flag: i64) -> Self {
        self.fields.push((name.into(), Some(flag)));
        self
    }

    /// Adds a field mapped to `1`.
    #[must_use]
    pub fn include(self, name: impl Into<String>) -> Self {
        self.field(name, 1)
    }

    /// Adds a field mapped to `0`.
    #[must_use]
    pub fn exclude(self, name: impl Into<String>) -> Self {
        self.field(name, 0)
    }

    /// Reads a projection from a JSON object, keeping key order.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidProjection`] if `value` is not an object.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(QueryError::InvalidProjection(format!(
                "expected an object, got {value}"
            )));
        };
        let fields = map
            .iter()
            .map(|(k, v)| (k.clone(), flag_from_json(v)))
            .collect();
        Ok(Self { fields })
    }

    /// Names of the selected fields, in order.
    pub fn selected(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().filter_map(|(name, flag)| {
            let keep = if name == ID_FIELD {
                *flag != Some(0)
            } else {
                *flag == Some(1)
            };
            keep.then_some(name.as_str())
        })
    }

    /// Writes the selected fields as a comma-separated column list.
    ///
    /// Each name is wrapped in `quote`; a `quote` inside a name becomes
    /// `[quote]`.
    #[must_use]
    pub fn to_sql(&self, quote: char) -> String {
        let escaped = format!("[{quote}]");
        self.selected()
            .map(|name| {
                let inner = name.replace(quote, &escaped);
                format!("{quote}{inner}{quote}")
            })
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Reads a flag; `1.0` and `0.0` count as `1` and `0`.
#[allow(clippy::float_cmp)]
fn flag_from_json(value: &Value) -> Option<i64> {
    if let Some(n) = value.as_i64() {
        return Some(n);
    }
    match value.as_f64() {
        Some(f) if f == 0.0 => Some(0),
        Some(f) if f == 1.0 => Some(1),
        _ => None,
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Projection {
    fn from_iter<T: IntoIterator<Item = (S, i64)>>(iter: T) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(name, flag)| (name.into(), Some(flag)))
                .collect(),
        }
    }
}
