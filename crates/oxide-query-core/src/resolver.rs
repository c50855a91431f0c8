//! Operator/clause resolution.
//!
//! Turns one `(field, comparator, value, prefix)` quadruple into a single SQL
//! boolean fragment, coercing the value by the field's schema type and
//! binding it through the [`ParamsStore`].
//!
//! | prefix | value kind       | comparator | clause                              |
//! |--------|------------------|------------|-------------------------------------|
//! | `+`    | any              | any        | `field = v`                         |
//! | `-`    | text             | any        | `field NOT LIKE '%'\|\|v\|\|'%'`    |
//! | `-`    | number or date   | `>`        | `field <= v`                        |
//! | `-`    | number or date   | `<`        | `field >= v`                        |
//! | `-`    | other            | any        | `field != v`                        |
//! | none   | text             | any        | `field LIKE '%'\|\|v\|\|'%'`        |
//! | none   | number or date   | `>`        | `field > v`                         |
//! | none   | number or date   | `<`        | `field < v`                         |
//! | none   | other            | any        | `field = v`                         |
//!
//! `?` behaves like no prefix here; it only affects grouping.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::date::{DateInput, DateNormalizer, resolve_relative};
use crate::dialect::Dialect;
use crate::lexer::{Comparator, Prefix};
use crate::params::ParamsStore;
use crate::schema::{FieldType, Schema};
use crate::value::SqlValue;

/// Comparison operators emitted by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// Equal (=)
    Eq,
    /// Not equal (!=)
    Ne,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Gte,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Lte,
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Eq => write!(f, "="),
            Self::Ne => write!(f, "!="),
            Self::Gt => write!(f, ">"),
            Self::Gte => write!(f, ">="),
            Self::Lt => write!(f, "<"),
            Self::Lte => write!(f, "<="),
        }
    }
}

/// How a coerced value is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Text: substring match.
    Text,
    /// Number: ordered comparison.
    Number,
    /// Date, whatever the normalizer produced: ordered comparison.
    Date,
    /// Anything else (booleans, NULL): equality.
    Other,
}

/// A search value after schema coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced {
    /// The value to bind.
    pub value: SqlValue,
    /// How the value is matched.
    pub kind: ValueKind,
}

impl Coerced {
    fn text(raw: &str) -> Self {
        Self {
            value: SqlValue::Text(raw.to_string()),
            kind: ValueKind::Text,
        }
    }
}

/// Resolves search clauses against a schema.
pub struct Resolver<'a> {
    schema: &'a Schema,
    dialect: &'a dyn Dialect,
    normalizer: &'a dyn DateNormalizer,
    now: DateTime<Utc>,
}

impl<'a> Resolver<'a> {
    /// Creates a resolver. `now` is the reference instant for relative dates.
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        dialect: &'a dyn Dialect,
        normalizer: &'a dyn DateNormalizer,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            schema,
            dialect,
            normalizer,
            now,
        }
    }

    /// Coerces a raw value by the schema type of `field`.
    ///
    /// Values on undeclared fields, and empty values, stay text.
    #[must_use]
    pub fn coerce(&self, field: &str, raw: &str) -> Coerced {
        let Some(spec) = self.schema.get(field).filter(|_| !raw.is_empty()) else {
            return Coerced::text(raw);
        };

        match spec.field_type {
            FieldType::String => Coerced::text(raw),
            FieldType::Number => coerce_number(raw),
            FieldType::Boolean => coerce_boolean(raw),
            FieldType::Date => {
                let input = resolve_relative(raw, self.now)
                    .map_or(DateInput::Text(raw), DateInput::Instant);
                Coerced {
                    value: self.normalizer.normalize(input),
                    kind: ValueKind::Date,
                }
            }
        }
    }

    /// Builds one clause and binds its value.
    pub fn resolve(
        &self,
        field: &str,
        comparator: Option<Comparator>,
        raw: &str,
        prefix: Option<Prefix>,
        params: &mut ParamsStore,
    ) -> String {
        let coerced = self.coerce(field, raw);
        tracing::trace!(field, raw, kind = ?coerced.kind, "resolving search clause");

        let negated = match prefix {
            Some(Prefix::Require) => {
                let placeholder = params.add(coerced.value);
                return format!("{field} {} {placeholder}", CompareOp::Eq);
            }
            Some(Prefix::Exclude) => true,
            Some(Prefix::Optional) | None => false,
        };

        let ordered = matches!(coerced.kind, ValueKind::Number | ValueKind::Date);
        let op = match (coerced.kind, comparator) {
            (ValueKind::Text, _) => {
                let placeholder = params.add(coerced.value);
                let pattern = self.dialect.substring_pattern(&placeholder);
                let like = if negated { "NOT LIKE" } else { "LIKE" };
                return format!("{field} {like} {pattern}");
            }
            (_, Some(Comparator::Gt)) if ordered => {
                if negated {
                    CompareOp::Lte
                } else {
                    CompareOp::Gt
                }
            }
            (_, Some(Comparator::Lt)) if ordered => {
                if negated {
                    CompareOp::Gte
                } else {
                    CompareOp::Lt
                }
            }
            _ => {
                if negated {
                    CompareOp::Ne
                } else {
                    CompareOp::Eq
                }
            }
        };

        let placeholder = params.add(coerced.value);
        format!("{field} {op} {placeholder}")
    }
}

fn coerce_number(raw: &str) -> Coerced {
    if let Ok(n) = raw.parse::<i64>() {
        return Coerced {
            value: SqlValue::Int(n),
            kind: ValueKind::Number,
        };
    }
    match raw.parse::<f64>() {
        Ok(f) if f.is_finite() => Coerced {
            value: SqlValue::Float(f),
            kind: ValueKind::Number,
        },
        _ => Coerced::text(raw),
    }
}

fn coerce_boolean(raw: &str) -> Coerced {
    let value = if raw.eq_ignore_ascii_case("true") {
        true
    } else if raw.eq_ignore_ascii_case("false") {
        false
    } else {
        return Coerced::text(raw);
    };
    Coerced {
        value: SqlValue::Bool(value),
        kind: ValueKind::Other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::EpochMillis;
    use crate::dialect::SqliteDialect;
    use crate::schema::FieldSpec;
    use chrono::TimeZone;

    fn schema() -> Schema {
        Schema::new()
            .field("name", FieldSpec::string())
            .field("age", FieldSpec::number())
            .field("active", FieldSpec::boolean())
            .field("created", FieldSpec::date())
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn resolve(
        field: &str,
        comparator: Option<Comparator>,
        raw: &str,
        prefix: Option<Prefix>,
    ) -> (String, Vec<SqlValue>) {
        let schema = schema();
        let resolver = Resolver::new(&schema, &SqliteDialect, &EpochMillis, now());
        let mut params = ParamsStore::new(":");
        let sql = resolver.resolve(field, comparator, raw, prefix, &mut params);
        (sql, params.values().cloned().collect())
    }

    #[test]
    fn test_text_substring() {
        let (sql, values) = resolve("name", Some(Comparator::Colon), "john", None);
        assert_eq!(sql, "name LIKE '%'||:p1||'%'");
        assert_eq!(values, vec![SqlValue::Text(String::from("john"))]);

        let (sql, _) = resolve("name", Some(Comparator::Gt), "john", None);
        assert_eq!(sql, "name LIKE '%'||:p1||'%'");
    }

    #[test]
    fn test_text_negated() {
        let (sql, _) = resolve("name", Some(Comparator::Colon), "john", Some(Prefix::Exclude));
        assert_eq!(sql, "name NOT LIKE '%'||:p1||'%'");
    }

    #[test]
    fn test_require_is_equality() {
        let (sql, values) = resolve("name", Some(Comparator::Colon), "john", Some(Prefix::Require));
        assert_eq!(sql, "name = :p1");
        assert_eq!(values, vec![SqlValue::Text(String::from("john"))]);

        let (sql, _) = resolve("age", Some(Comparator::Gt), "5", Some(Prefix::Require));
        assert_eq!(sql, "age = :p1");
    }

    #[test]
    fn test_number_comparisons() {
        let (sql, values) = resolve("age", Some(Comparator::Gt), "5", None);
        assert_eq!(sql, "age > :p1");
        assert_eq!(values, vec![SqlValue::Int(5)]);

        assert_eq!(resolve("age", Some(Comparator::Lt), "5", None).0, "age < :p1");
        assert_eq!(resolve("age", Some(Comparator::Colon), "5", None).0, "age = :p1");
        assert_eq!(
            resolve("age", Some(Comparator::Gt), "5", Some(Prefix::Exclude)).0,
            "age <= :p1"
        );
        assert_eq!(
            resolve("age", Some(Comparator::Lt), "5", Some(Prefix::Exclude)).0,
            "age >= :p1"
        );
        assert_eq!(
            resolve("age", Some(Comparator::Colon), "5", Some(Prefix::Exclude)).0,
            "age != :p1"
        );
    }

    #[test]
    fn test_number_float_and_fallback() {
        let (_, values) = resolve("age", Some(Comparator::Gt), "2.5", None);
        assert_eq!(values, vec![SqlValue::Float(2.5)]);

        let (sql, values) = resolve("age", Some(Comparator::Gt), "old", None);
        assert_eq!(sql, "age LIKE '%'||:p1||'%'");
        assert_eq!(values, vec![SqlValue::Text(String::from("old"))]);

        let (sql, _) = resolve("age", Some(Comparator::Gt), "inf", None);
        assert_eq!(sql, "age LIKE '%'||:p1||'%'");
    }

    #[test]
    fn test_boolean() {
        let (sql, values) = resolve("active", Some(Comparator::Colon), "true", None);
        assert_eq!(sql, "active = :p1");
        assert_eq!(values, vec![SqlValue::Bool(true)]);

        let (sql, values) = resolve("active", Some(Comparator::Gt), "FALSE", Some(Prefix::Exclude));
        assert_eq!(sql, "active != :p1");
        assert_eq!(values, vec![SqlValue::Bool(false)]);
    }

    #[test]
    fn test_relative_date() {
        let (sql, values) = resolve("created", Some(Comparator::Gt), "-1d", None);
        assert_eq!(sql, "created > :p1");
        assert_eq!(values, vec![SqlValue::Int(1_709_294_400_000 - 86_400_000)]);
    }

    #[test]
    fn test_now_date_negated() {
        let (sql, values) = resolve("created", Some(Comparator::Lt), "NOW", Some(Prefix::Exclude));
        assert_eq!(sql, "created >= :p1");
        assert_eq!(values, vec![SqlValue::Int(1_709_294_400_000)]);
    }

    #[test]
    fn test_absolute_date_text_is_normalized() {
        let (sql, values) = resolve("created", Some(Comparator::Colon), "2024-03-01", None);
        assert_eq!(sql, "created = :p1");
        assert_eq!(values, vec![SqlValue::Int(1_709_251_200_000)]);
    }

    #[test]
    fn test_undeclared_field_is_text() {
        let (sql, values) = resolve("other", Some(Comparator::Gt), "5", None);
        assert_eq!(sql, "other LIKE '%'||:p1||'%'");
        assert_eq!(values, vec![SqlValue::Text(String::from("5"))]);
    }

    #[test]
    fn test_compare_op_display() {
        assert_eq!(CompareOp::Ne.to_string(), "!=");
        assert_eq!(CompareOp::Gte.to_string(), ">=");
    }
}
