//! Ordered parameter store.
//!
//! A [`ParamsStore`] is created fresh for each translation. Values are only
//! ever appended; each call to [`ParamsStore::add`] returns a placeholder
//! reference that is unique for the lifetime of the store.

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::value::{SqlValue, ToSqlValue};

/// Placeholder names are `p1`, `p2`, ... in insertion order.
const NAME_PREFIX: &str = "p";

/// Accumulates bound values in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct ParamsStore {
    /// Prefix written before a name in statement text (`:` for SQLite).
    sigil: &'static str,
    data: Vec<(String, SqlValue)>,
}

impl ParamsStore {
    /// Creates an empty store whose references are written as `{sigil}{name}`.
    #[must_use]
    pub const fn new(sigil: &'static str) -> Self {
        Self {
            sigil,
            data: Vec::new(),
        }
    }

    /// Binds a value and returns the placeholder reference for the statement.
    pub fn add<T: ToSqlValue>(&mut self, value: T) -> String {
        let name = format!("{NAME_PREFIX}{}", self.data.len() + 1);
        let reference = format!("{}{name}", self.sigil);
        self.data.push((name, value.to_sql_value()));
        reference
    }

    /// Returns the bound values as `(name, value)` pairs in insertion order.
    #[must_use]
    pub fn bindings(&self) -> &[(String, SqlValue)] {
        &self.data
    }

    /// Looks up a bound value by placeholder name (without the sigil).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.data.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns the bound values in insertion order, for positional binding.
    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.data.iter().map(|(_, v)| v)
    }

    /// Returns the number of bound values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if nothing has been bound.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consumes the store and returns its bindings.
    #[must_use]
    pub fn into_bindings(self) -> Vec<(String, SqlValue)> {
        self.data
    }
}

impl Serialize for ParamsStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (name, value) in &self.data {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}
