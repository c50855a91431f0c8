//! Schema descriptors.
//!
//! A [`Schema`] maps field names to a [`FieldSpec`] and keeps the order in
//! which fields were declared. That order drives free-text expansion and
//! therefore placeholder numbering.

use std::fmt;

use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

/// The value kind stored in a field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// Free text (the default).
    #[default]
    String,
    /// Integer or floating point number.
    Number,
    /// Boolean.
    Boolean,
    /// Point in time; accepts `NOW` and relative literals such as `-3d`.
    Date,
}

/// Per-field metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FieldSpec {
    /// Value kind used to coerce search-string values.
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    /// Whether bare search terms are matched against this field.
    #[serde(rename = "isAny", default = "default_is_any")]
    pub is_any: bool,
}

const fn default_is_any() -> bool {
    true
}

impl Default for FieldSpec {
    fn default() -> Self {
        Self::of(FieldType::String)
    }
}

impl FieldSpec {
    /// Creates a spec of the given type that takes part in free-text search.
    #[must_use]
    pub const fn of(field_type: FieldType) -> Self {
        Self {
            field_type,
            is_any: true,
        }
    }

    /// A string field.
    #[must_use]
    pub const fn string() -> Self {
        Self::of(FieldType::String)
    }

    /// A number field.
    #[must_use]
    pub const fn number() -> Self {
        Self::of(FieldType::Number)
    }

    /// A boolean field.
    #[must_use]
    pub const fn boolean() -> Self {
        Self::of(FieldType::Boolean)
    }

    /// A date field.
    #[must_use]
    pub const fn date() -> Self {
        Self::of(FieldType::Date)
    }

    /// Excludes the field from free-text search.
    #[must_use]
    pub const fn not_any(mut self) -> Self {
        self.is_any = false;
        self
    }

    /// Whether a bare search term expands onto this field.
    #[must_use]
    pub const fn is_free_text(&self) -> bool {
        matches!(self.field_type, FieldType::String) && self.is_any
    }
}

/// Ordered field descriptors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    /// Creates an empty schema.
    #[must_use]
    pub const fn new() -> Self {
        Self { fields: Vec::new() }
    }

    /// Adds a field, replacing the spec in place if the name already exists.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(name, spec);
        self
    }

    /// Inserts a field, keeping its original position when it already exists.
    pub fn insert(&mut self, name: impl Into<String>, spec: FieldSpec) {
        let name = name.into();
        if let Some(slot) = self.fields.iter_mut().find(|(n, _)| *n == name) {
            slot.1 = spec;
        } else {
            self.fields.push((name, spec));
        }
    }

    /// Returns the spec for a field.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, s)| s)
    }

    /// Returns true if the field is declared.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Iterates fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(n, s)| (n.as_str(), s))
    }

    /// Fields a bare search term expands onto, in declaration order.
    pub fn free_text_fields(&self) -> impl Iterator<Item = &str> {
        self.iter()
            .filter(|(_, spec)| spec.is_free_text())
            .map(|(name, _)| name)
    }

    /// Returns the number of declared fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Returns true if no fields are declared.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FieldSpec)> for Schema {
    fn from_iter<I: IntoIterator<Item = (S, FieldSpec)>>(iter: I) -> Self {
        let mut schema = Self::new();
        for (name, spec) in iter {
            schema.insert(name, spec);
        }
        schema
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field names to field descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Schema, A::Error> {
                let mut schema = Schema::new();
                while let Some((name, spec)) = access.next_entry::<String, FieldSpec>()? {
                    schema.insert(name, spec);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
