#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use oxide_query_core::{Condition, FieldSpec, QueryTranslator, Schema, SqlValue, Translation};
use serde_json::Value;

/// 2024-03-01T12:00:00Z, used as the reference instant for relative dates.
pub const REFERENCE_MS: i64 = 1_709_294_400_000;

pub fn reference_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

/// A schema covering every field type.
pub fn schema() -> Schema {
    Schema::new()
        .field("name", FieldSpec::string())
        .field("bio", FieldSpec::string())
        .field("slug", FieldSpec::string().not_any())
        .field("age", FieldSpec::number())
        .field("active", FieldSpec::boolean())
        .field("created", FieldSpec::date())
        .field("data", FieldSpec::string().not_any())
}

pub fn translator() -> QueryTranslator {
    QueryTranslator::new(schema()).with_reference_time(reference_time())
}

pub fn search(input: &str) -> Translation {
    translator()
        .parse(input)
        .unwrap_or_else(|e| panic!("Failed to translate: {input}\nError: {e:?}"))
}

pub fn condition(json: Value) -> Translation {
    let tree = Condition::from_json(&json)
        .unwrap_or_else(|e| panic!("Invalid condition: {json}\nError: {e:?}"));
    translator()
        .parse(tree)
        .unwrap_or_else(|e| panic!("Failed to translate: {json}\nError: {e:?}"))
}

pub fn text(s: &str) -> SqlValue {
    SqlValue::Text(s.to_string())
}

/// Bound values in placeholder order.
pub fn values(out: &Translation) -> Vec<SqlValue> {
    out.params().values().cloned().collect()
}

/// Asserts that no bound text value appears in the statement once the
/// placeholder references are removed.
pub fn assert_no_interpolation(out: &Translation) {
    let mut statement = out.statement().to_string();
    for (name, _) in out.bindings().iter().rev() {
        statement = statement.replace(&format!(":{name}"), "");
    }
    for (name, value) in out.bindings() {
        if let SqlValue::Text(s) = value {
            if s.is_empty() {
                continue;
            }
            assert!(
                !statement.contains(s.as_str()),
                "value of {name} ({s:?}) leaked into statement: {}",
                out.statement()
            );
        }
    }
}
