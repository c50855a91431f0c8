//! Condition tree types.
//!
//! Values are classified once, when the tree is built, into a closed set of
//! variants so that translation never has to probe shapes again.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value};

use crate::date::parse_instant;
use crate::error::{QueryError, Result};
use crate::value::{SqlValue, ToSqlValue};

/// Key marking a date in JSON input: `{"$date": "2024-01-01T00:00:00Z"}`.
pub const DATE_KEY: &str = "$date";

/// A node of a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// `$or`: any child holds.
    Or(Vec<Condition>),
    /// `$and`: every child holds.
    And(Vec<Condition>),
    /// Field constraints, AND'ed in order.
    Leaf(Vec<(String, CondValue)>),
}

/// The value side of a leaf entry.
#[derive(Debug, Clone, PartialEq)]
pub enum CondValue {
    /// Equality against a scalar.
    Scalar(SqlValue),
    /// Membership in a list.
    List(Vec<SqlValue>),
    /// Equality against a date, bound through the date normalizer.
    Date(DateTime<Utc>),
    /// A single-operator object such as `{"$gt": 5}`.
    Operator(Operator, Operand),
    /// Any other object: equality against its JSON text.
    Document(Map<String, Value>),
}

/// Payload of an operator object.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A scalar.
    Scalar(SqlValue),
    /// A list of scalars.
    List(Vec<SqlValue>),
    /// A date; bound as epoch milliseconds.
    Date(DateTime<Utc>),
    /// A nested object; bound as JSON text.
    Object(Value),
}

/// Recognized operator keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    /// `$in`
    In,
    /// `$nin`
    Nin,
    /// `$like`
    Like,
    /// `$nlike`
    NotLike,
    /// `$substr`
    Substr,
    /// `$nsubstr`
    NotSubstr,
    /// `$exists`
    Exists,
    /// `$gt`
    Gt,
    /// `$gte`
    Gte,
    /// `$lt`
    Lt,
    /// `$lte`
    Lte,
    /// `$ne`
    Ne,
}

impl Operator {
    /// Looks up an operator by its key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "$in" => Self::In,
            "$nin" => Self::Nin,
            "$like" => Self::Like,
            "$nlike" => Self::NotLike,
            "$substr" => Self::Substr,
            "$nsubstr" => Self::NotSubstr,
            "$exists" => Self::Exists,
            "$gt" => Self::Gt,
            "$gte" => Self::Gte,
            "$lt" => Self::Lt,
            "$lte" => Self::Lte,
            "$ne" => Self::Ne,
            _ => return None,
        })
    }

    /// Returns the operator key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::In => "$in",
            Self::Nin => "$nin",
            Self::Like => "$like",
            Self::NotLike => "$nlike",
            Self::Substr => "$substr",
            Self::NotSubstr => "$nsubstr",
            Self::Exists => "$exists",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Ne => "$ne",
        }
    }
}

impl Condition {
    /// An `$or` node.
    #[must_use]
    pub fn or(children: impl IntoIterator<Item = Self>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    /// An `$and` node.
    #[must_use]
    pub fn and(children: impl IntoIterator<Item = Self>) -> Self {
        Self::And(children.into_iter().collect())
    }

    /// A leaf with the given entries.
    #[must_use]
    pub fn leaf<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<CondValue>,
    {
        Self::Leaf(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// A leaf with a single entry.
    #[must_use]
    pub fn field(name: impl Into<String>, value: impl Into<CondValue>) -> Self {
        Self::Leaf(vec![(name.into(), value.into())])
    }

    /// Builds a tree from JSON.
    ///
    /// An object holding an `$or` (or else `$and`) array is a combinator and
    /// its other keys are ignored; any other object is a leaf.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidCondition`] for a node that is not an
    /// object and [`QueryError::InvalidDate`] for a malformed `$date`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let Value::Object(map) = value else {
            return Err(QueryError::InvalidCondition(format!(
                "expected an object, found {value}"
            )));
        };

        if let Some(Value::Array(children)) = map.get("$or") {
            return children.iter().map(Self::from_json).collect::<Result<_>>().map(Self::Or);
        }
        if let Some(Value::Array(children)) = map.get("$and") {
            return children.iter().map(Self::from_json).collect::<Result<_>>().map(Self::And);
        }

        map.iter()
            .map(|(field, value)| Ok((field.clone(), CondValue::from_json(value)?)))
            .collect::<Result<_>>()
            .map(Self::Leaf)
    }

    /// Parses a JSON document into a tree.
    ///
    /// # Errors
    ///
    /// Fails on malformed JSON or an invalid tree.
    pub fn from_json_str(input: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(input)?;
        Self::from_json(&value)
    }
}

impl CondValue {
    /// An operator object.
    #[must_use]
    pub fn op(operator: Operator, operand: impl Into<Operand>) -> Self {
        Self::Operator(operator, operand.into())
    }

    /// A list of values.
    #[must_use]
    pub fn list<T: ToSqlValue>(items: impl IntoIterator<Item = T>) -> Self {
        Self::List(items.into_iter().map(ToSqlValue::to_sql_value).collect())
    }

    /// Classifies a JSON value.
    ///
    /// An object is an operator when its first key is a recognized operator;
    /// later keys are ignored. `$in` and `$nin` need a list payload.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidDate`] for a malformed `$date`.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => list_from_json(items).map(Self::List),
            Value::Object(map) => {
                if let Some(date) = date_from_json(map) {
                    return date.map(Self::Date);
                }
                let Some((key, payload)) = map.iter().next() else {
                    return Ok(Self::Document(map.clone()));
                };
                match Operator::from_key(key) {
                    // Membership without a list compares the whole object.
                    Some(Operator::In | Operator::Nin) if !payload.is_array() => {}
                    Some(operator) => {
                        if map.len() > 1 {
                            tracing::debug!(key = %key, "operator object has extra keys, using the first");
                        }
                        return Ok(Self::Operator(operator, Operand::from_json(payload)?));
                    }
                    None if key.starts_with('$') => {
                        tracing::warn!(key = %key, "unrecognized operator, comparing the whole object");
                    }
                    None => {}
                }
                Ok(Self::Document(map.clone()))
            }
            scalar => Ok(Self::Scalar(scalar_from_json(scalar))),
        }
    }
}

impl Operand {
    /// Classifies a JSON operator payload.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidDate`] for a malformed `$date`.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Array(items) => list_from_json(items).map(Self::List),
            Value::Object(map) => match date_from_json(map) {
                Some(date) => date.map(Self::Date),
                None => Ok(Self::Object(value.clone())),
            },
            scalar => Ok(Self::Scalar(scalar_from_json(scalar))),
        }
    }

    /// Converts the payload back into JSON.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Scalar(v) => v.to_json(),
            Self::List(items) => Value::Array(items.iter().map(SqlValue::to_json).collect()),
            Self::Date(d) => date_to_json(*d),
            Self::Object(v) => v.clone(),
        }
    }
}

fn scalar_from_json(value: &Value) -> SqlValue {
    SqlValue::from_json(value).unwrap_or(SqlValue::Null)
}

/// List elements: scalars as-is, dates as epoch milliseconds, anything else
/// as JSON text.
fn list_from_json(items: &[Value]) -> Result<Vec<SqlValue>> {
    items
        .iter()
        .map(|item| {
            if let Some(value) = SqlValue::from_json(item) {
                return Ok(value);
            }
            if let Value::Object(map) = item {
                if let Some(date) = date_from_json(map) {
                    return date.map(|d| SqlValue::Int(d.timestamp_millis()));
                }
            }
            Ok(SqlValue::Text(item.to_string()))
        })
        .collect()
}

/// Reads `{"$date": ..}`; `None` when the object is not a date.
fn date_from_json(map: &Map<String, Value>) -> Option<Result<DateTime<Utc>>> {
    if map.len() != 1 {
        return None;
    }
    let payload = map.get(DATE_KEY)?;
    let date = match payload {
        Value::String(text) => parse_instant(text),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    };
    Some(date.ok_or_else(|| QueryError::InvalidDate(payload.to_string())))
}

fn date_to_json(date: DateTime<Utc>) -> Value {
    let mut map = Map::new();
    map.insert(
        DATE_KEY.to_string(),
        Value::String(date.to_rfc3339_opts(SecondsFormat::Millis, true)),
    );
    Value::Object(map)
}

macro_rules! impl_from_scalar {
    ($($ty:ty),+) => {
        $(
            impl From<$ty> for CondValue {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.to_sql_value())
                }
            }

            impl From<$ty> for Operand {
                fn from(value: $ty) -> Self {
                    Self::Scalar(value.to_sql_value())
                }
            }
        )+
    };
}

impl_from_scalar!(SqlValue, bool, i32, i64, f64, &str, String);

impl From<DateTime<Utc>> for CondValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl From<DateTime<Utc>> for Operand {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Date(value)
    }
}

impl<T: ToSqlValue> From<Vec<T>> for CondValue {
    fn from(items: Vec<T>) -> Self {
        Self::list(items)
    }
}

impl<T: ToSqlValue> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(ToSqlValue::to_sql_value).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_combinators() {
        let cond = Condition::from_json(&json!({"$or": [{"a": 1}, {"$and": [{"b": 2}]}]})).unwrap();
        assert_eq!(
            cond,
            Condition::or([
                Condition::field("a", 1),
                Condition::and([Condition::field("b", 2)]),
            ])
        );
    }

    #[test]
    fn test_or_wins_over_other_keys() {
        let cond = Condition::from_json(&json!({"$or": [], "a": 1})).unwrap();
        assert_eq!(cond, Condition::Or(vec![]));
    }

    #[test]
    fn test_non_array_combinator_is_a_field() {
        let cond = Condition::from_json(&json!({"$or": 1})).unwrap();
        assert_eq!(cond, Condition::field("$or", 1));
    }

    #[test]
    fn test_value_classification() {
        assert_eq!(CondValue::from_json(&json!(null)).unwrap(), CondValue::Scalar(SqlValue::Null));
        assert_eq!(
            CondValue::from_json(&json!([1, "x"])).unwrap(),
            CondValue::List(vec![SqlValue::Int(1), SqlValue::Text(String::from("x"))])
        );
        assert_eq!(
            CondValue::from_json(&json!({"$gt": 5})).unwrap(),
            CondValue::op(Operator::Gt, 5)
        );
        assert!(matches!(
            CondValue::from_json(&json!({"$regex": "x"})).unwrap(),
            CondValue::Document(_)
        ));
        assert_eq!(
            CondValue::from_json(&json!({"$gt": 1, "$lt": 5})).unwrap(),
            CondValue::op(Operator::Gt, 1)
        );
        assert!(matches!(
            CondValue::from_json(&json!({"k": 1, "$gt": 5})).unwrap(),
            CondValue::Document(_)
        ));
        assert!(matches!(
            CondValue::from_json(&json!({"$in": 5, "$gt": 1})).unwrap(),
            CondValue::Document(_)
        ));
        assert!(matches!(
            CondValue::from_json(&json!({})).unwrap(),
            CondValue::Document(_)
        ));
    }

    #[test]
    fn test_dates() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            CondValue::from_json(&json!({"$date": "2024-01-01T00:00:00Z"})).unwrap(),
            CondValue::Date(instant)
        );
        assert_eq!(
            CondValue::from_json(&json!({"$lt": {"$date": 1_704_067_200_000_i64}})).unwrap(),
            CondValue::op(Operator::Lt, instant)
        );
        assert_eq!(
            CondValue::from_json(&json!([{"$date": "2024-01-01"}])).unwrap(),
            CondValue::List(vec![SqlValue::Int(1_704_067_200_000)])
        );
    }

    #[test]
    fn test_invalid_date() {
        let err = CondValue::from_json(&json!({"$date": "soon"})).unwrap_err();
        assert!(matches!(err, QueryError::InvalidDate(_)));
    }

    #[test]
    fn test_invalid_node() {
        assert!(matches!(
            Condition::from_json(&json!([1])),
            Err(QueryError::InvalidCondition(_))
        ));
        assert!(matches!(
            Condition::from_json(&json!({"$and": [1]})),
            Err(QueryError::InvalidCondition(_))
        ));
        assert!(matches!(
            Condition::from_json_str("{"),
            Err(QueryError::Json(_))
        ));
    }

    #[test]
    fn test_operator_keys_round_trip() {
        let keys = [
            "$in", "$nin", "$like", "$nlike", "$substr", "$nsubstr", "$exists", "$gt", "$gte",
            "$lt", "$lte", "$ne",
        ];
        for key in keys {
            assert_eq!(Operator::from_key(key).map(Operator::key), Some(key));
        }
        assert_eq!(Operator::from_key("$eq"), None);
    }
}
