//! Condition tree translation.

use crate::date::{DateInput, DateNormalizer, epoch_millis};
use crate::dialect::Dialect;
use crate::error::Result;
use crate::params::ParamsStore;
use crate::resolver::CompareOp;
use crate::schema::Schema;
use crate::value::SqlValue;

use super::node::{CondValue, Condition, Operand, Operator};

/// Translates condition trees by recursive descent.
pub struct ConditionParser<'a> {
    schema: &'a Schema,
    dialect: &'a dyn Dialect,
    normalizer: &'a dyn DateNormalizer,
    strict: bool,
}

impl<'a> ConditionParser<'a> {
    /// Creates a parser. In strict mode, every leaf field must be in the schema.
    #[must_use]
    pub fn new(
        schema: &'a Schema,
        dialect: &'a dyn Dialect,
        normalizer: &'a dyn DateNormalizer,
        strict: bool,
    ) -> Self {
        Self {
            schema,
            dialect,
            normalizer,
            strict,
        }
    }

    /// Translates a node. A node without clauses is `TRUE`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownField`] in strict mode.
    ///
    /// [`QueryError::UnknownField`]: crate::QueryError::UnknownField
    pub fn eval(&self, node: &Condition, params: &mut ParamsStore) -> Result<String> {
        let clauses = match node {
            Condition::Or(children) => {
                return self.join(children, " OR ", params);
            }
            Condition::And(children) => {
                return self.join(children, " AND ", params);
            }
            Condition::Leaf(entries) => {
                let mut clauses = Vec::new();
                for (field, value) in entries {
                    self.leaf_entry(field, value, params, &mut clauses)?;
                }
                clauses
            }
        };

        if clauses.is_empty() {
            return Ok(String::from("TRUE"));
        }
        Ok(clauses.join(" AND "))
    }

    fn join(&self, children: &[Condition], joiner: &str, params: &mut ParamsStore) -> Result<String> {
        if children.is_empty() {
            return Ok(String::from("TRUE"));
        }
        let parts = children
            .iter()
            .map(|child| self.eval(child, params))
            .collect::<Result<Vec<_>>>()?;
        Ok(parts.join(joiner))
    }

    /// Reads a field reference; `col.a.b` becomes a JSON-path lookup on `col`.
    fn column(&self, field: &str) -> Result<String> {
        if self.strict {
            crate::check_identifier(self.schema, field)?;
        }
        let mut segments = field.split('.');
        let column = segments.next().unwrap_or(field);
        let path: Vec<&str> = segments.collect();
        if path.is_empty() {
            return Ok(field.to_string());
        }
        Ok(self.dialect.json_extract(column, &path))
    }

    fn leaf_entry(
        &self,
        field: &str,
        value: &CondValue,
        params: &mut ParamsStore,
        out: &mut Vec<String>,
    ) -> Result<()> {
        tracing::trace!(field, ?value, "condition entry");
        let column = self.column(field)?;

        match value {
            CondValue::Scalar(v) => out.push(equality(&column, v.clone(), params)),
            CondValue::Date(d) => {
                let normalized = self.normalizer.normalize(DateInput::Instant(*d));
                out.push(equality(&column, normalized, params));
            }
            CondValue::List(items) => out.extend(in_list(&column, items, params)),
            CondValue::Document(map) => {
                let text = serde_json::Value::Object(map.clone()).to_string();
                out.push(equality(&column, SqlValue::Text(text), params));
            }
            CondValue::Operator(op, operand) => {
                out.extend(self.operator(&column, *op, operand, params));
            }
        }
        Ok(())
    }

    fn operator(
        &self,
        column: &str,
        op: Operator,
        operand: &Operand,
        params: &mut ParamsStore,
    ) -> Option<String> {
        if let Operand::List(items) = operand {
            match op {
                Operator::In => return in_list(column, items, params),
                Operator::Nin => return Some(not_in_list(column, items, params)),
                _ => {}
            }
        }

        let payload = match operand {
            Operand::Scalar(v) => v.clone(),
            Operand::Date(d) => epoch_millis(*d),
            Operand::List(_) | Operand::Object(_) => SqlValue::Text(operand.to_json().to_string()),
        };

        let clause = match op {
            Operator::Like => format!("{column} LIKE {}", params.add(payload)),
            Operator::NotLike => format!("{column} NOT LIKE {}", params.add(payload)),
            Operator::Substr => {
                let pattern = self.dialect.substring_pattern(&params.add(payload));
                format!("{column} LIKE {pattern}")
            }
            Operator::NotSubstr => {
                let pattern = self.dialect.substring_pattern(&params.add(payload));
                format!("{column} NOT LIKE {pattern}")
            }
            Operator::Exists => {
                if payload.is_truthy() {
                    format!("{column} IS NOT NULL")
                } else {
                    format!("{column} IS NULL")
                }
            }
            Operator::Gt => compare(column, CompareOp::Gt, payload, params),
            Operator::Gte => compare(column, CompareOp::Gte, payload, params),
            Operator::Lt => compare(column, CompareOp::Lt, payload, params),
            Operator::Lte => compare(column, CompareOp::Lte, payload, params),
            Operator::Ne => compare(column, CompareOp::Ne, payload, params),
            Operator::In | Operator::Nin => {
                tracing::debug!(
                    column,
                    operator = op.key(),
                    "non-list membership payload, comparing the whole object"
                );
                let mut object = serde_json::Map::new();
                object.insert(op.key().to_string(), operand.to_json());
                let text = serde_json::Value::Object(object).to_string();
                equality(column, SqlValue::Text(text), params)
            }
        };
        Some(clause)
    }
}

fn compare(column: &str, op: CompareOp, value: SqlValue, params: &mut ParamsStore) -> String {
    format!("{column} {op} {}", params.add(value))
}

fn equality(column: &str, value: SqlValue, params: &mut ParamsStore) -> String {
    compare(column, CompareOp::Eq, value, params)
}

/// `IN` for several values, `=` for one, nothing for none.
fn in_list(column: &str, items: &[SqlValue], params: &mut ParamsStore) -> Option<String> {
    match items {
        [] => None,
        [only] => Some(equality(column, only.clone(), params)),
        _ => {
            let placeholders: Vec<String> = items.iter().map(|v| params.add(v.clone())).collect();
            Some(format!("{column} IN ({})", placeholders.join(",")))
        }
    }
}

/// `NOT IN` for several values, `!=` otherwise.
///
/// An empty list is not short-circuited the way [`in_list`] does: it binds
/// NULL and yields `column != NULL`, which matches no row.
fn not_in_list(column: &str, items: &[SqlValue], params: &mut ParamsStore) -> String {
    if items.len() > 1 {
        let placeholders: Vec<String> = items.iter().map(|v| params.add(v.clone())).collect();
        return format!("{column} NOT IN ({})", placeholders.join(","));
    }
    let value = items.first().cloned().unwrap_or(SqlValue::Null);
    compare(column, CompareOp::Ne, value, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::date::EpochMillis;
    use crate::dialect::SqliteDialect;
    use crate::schema::FieldSpec;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn eval(node: &Condition) -> (String, Vec<SqlValue>) {
        let schema = Schema::new();
        let parser = ConditionParser::new(&schema, &SqliteDialect, &EpochMillis, false);
        let mut params = ParamsStore::new(":");
        let sql = parser.eval(node, &mut params).unwrap();
        (sql, params.values().cloned().collect())
    }

    fn eval_json(value: serde_json::Value) -> (String, Vec<SqlValue>) {
        eval(&Condition::from_json(&value).unwrap())
    }

    #[test]
    fn test_scalar_equality() {
        let (sql, values) = eval_json(json!({"a": 1, "b": "x"}));
        assert_eq!(sql, "a = :p1 AND b = :p2");
        assert_eq!(values, vec![SqlValue::Int(1), SqlValue::Text(String::from("x"))]);
    }

    #[test]
    fn test_falsy_values_still_compare() {
        let (sql, values) = eval_json(json!({"a": null, "b": 0, "c": false, "d": ""}));
        assert_eq!(sql, "a = :p1 AND b = :p2 AND c = :p3 AND d = :p4");
        assert_eq!(
            values,
            vec![
                SqlValue::Null,
                SqlValue::Int(0),
                SqlValue::Bool(false),
                SqlValue::Text(String::new()),
            ]
        );
    }

    #[test]
    fn test_combinators() {
        assert_eq!(eval_json(json!({"$or": [{"a": 1}, {"b": 2}]})).0, "a = :p1 OR b = :p2");
        assert_eq!(eval_json(json!({"$and": [{"a": 1}, {"b": 2}]})).0, "a = :p1 AND b = :p2");
        assert_eq!(
            eval_json(json!({"$and": [{"$or": [{"a": 1}, {"b": 2}]}, {"c": 3}]})).0,
            "a = :p1 OR b = :p2 AND c = :p3"
        );
    }

    #[test]
    fn test_empty_nodes_are_true() {
        assert_eq!(eval_json(json!({})).0, "TRUE");
        assert_eq!(eval_json(json!({"$or": []})).0, "TRUE");
        assert_eq!(eval_json(json!({"$and": [{}, {"a": 1}]})).0, "TRUE AND a = :p1");
    }

    #[test]
    fn test_lists() {
        let (sql, values) = eval_json(json!({"a": [1, 2, 3]}));
        assert_eq!(sql, "a IN (:p1,:p2,:p3)");
        assert_eq!(values.len(), 3);
        assert_eq!(eval_json(json!({"a": [7]})).0, "a = :p1");
        assert_eq!(eval_json(json!({"a": []})).0, "TRUE");
        assert_eq!(eval_json(json!({"a": [], "b": 1})).0, "b = :p1");
    }

    #[test]
    fn test_in_operator() {
        assert_eq!(eval_json(json!({"a": {"$in": [1, 2, 3]}})).0, "a IN (:p1,:p2,:p3)");
        assert_eq!(eval_json(json!({"a": {"$in": ["x"]}})).0, "a = :p1");
        let (sql, values) = eval_json(json!({"a": {"$in": []}}));
        assert_eq!(sql, "TRUE");
        assert!(values.is_empty());
    }

    #[test]
    fn test_nin_operator() {
        assert_eq!(eval_json(json!({"a": {"$nin": [1, 2]}})).0, "a NOT IN (:p1,:p2)");
        assert_eq!(eval_json(json!({"a": {"$nin": [1]}})).0, "a != :p1");
    }

    #[test]
    fn test_empty_nin_binds_null() {
        let (sql, values) = eval_json(json!({"a": {"$nin": []}}));
        assert_eq!(sql, "a != :p1");
        assert_eq!(values, vec![SqlValue::Null]);
    }

    #[test]
    fn test_pattern_operators() {
        assert_eq!(eval_json(json!({"a": {"$like": "x%"}})).0, "a LIKE :p1");
        assert_eq!(eval_json(json!({"a": {"$nlike": "x%"}})).0, "a NOT LIKE :p1");
        assert_eq!(eval_json(json!({"a": {"$substr": "x"}})).0, "a LIKE '%'||:p1||'%'");
        assert_eq!(
            eval_json(json!({"a": {"$nsubstr": "x"}})).0,
            "a NOT LIKE '%'||:p1||'%'"
        );
    }

    #[test]
    fn test_comparison_operators() {
        assert_eq!(eval_json(json!({"a": {"$gt": 1}})).0, "a > :p1");
        assert_eq!(eval_json(json!({"a": {"$gte": 1}})).0, "a >= :p1");
        assert_eq!(eval_json(json!({"a": {"$lt": 1}})).0, "a < :p1");
        assert_eq!(eval_json(json!({"a": {"$lte": 1}})).0, "a <= :p1");
        assert_eq!(eval_json(json!({"a": {"$ne": 1}})).0, "a != :p1");
    }

    #[test]
    fn test_exists() {
        let (sql, values) = eval_json(json!({"a": {"$exists": true}}));
        assert_eq!(sql, "a IS NOT NULL");
        assert!(values.is_empty());
        assert_eq!(eval_json(json!({"a": {"$exists": false}})).0, "a IS NULL");
        assert_eq!(eval_json(json!({"a": {"$exists": 0}})).0, "a IS NULL");
        assert_eq!(eval_json(json!({"a": {"$exists": {}}})).0, "a IS NOT NULL");
    }

    #[test]
    fn test_nested_object_payload_is_json_text() {
        let (sql, values) = eval_json(json!({"a": {"$ne": {"x": 1}}}));
        assert_eq!(sql, "a != :p1");
        assert_eq!(values, vec![SqlValue::Text(String::from(r#"{"x":1}"#))]);

        let (_, values) = eval_json(json!({"a": {"$gt": [1, 2]}}));
        assert_eq!(values, vec![SqlValue::Text(String::from("[1,2]"))]);
    }

    #[test]
    fn test_unknown_operator_compares_whole_object() {
        let (sql, values) = eval_json(json!({"a": {"$regex": "^x"}}));
        assert_eq!(sql, "a = :p1");
        assert_eq!(values, vec![SqlValue::Text(String::from(r#"{"$regex":"^x"}"#))]);
    }

    #[test]
    fn test_membership_without_list_compares_whole_object() {
        let (sql, values) = eval_json(json!({"a": {"$in": 5}}));
        assert_eq!(sql, "a = :p1");
        assert_eq!(values, vec![SqlValue::Text(String::from(r#"{"$in":5}"#))]);
    }

    #[test]
    fn test_json_path() {
        let (sql, _) = eval_json(json!({"data.user.name": "bob"}));
        assert_eq!(sql, "json_extract(data, '$.user.name') = :p1");
    }

    #[test]
    fn test_dates() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let (sql, values) = eval(&Condition::field("created", instant));
        assert_eq!(sql, "created = :p1");
        assert_eq!(values, vec![SqlValue::Int(1_704_067_200_000)]);

        let (sql, values) = eval(&Condition::field(
            "created",
            CondValue::op(Operator::Gte, instant),
        ));
        assert_eq!(sql, "created >= :p1");
        assert_eq!(values, vec![SqlValue::Int(1_704_067_200_000)]);
    }

    #[test]
    fn test_leaf_date_uses_normalizer() {
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let iso = |input: DateInput<'_>| match input {
            DateInput::Instant(i) => SqlValue::Text(i.format("%Y-%m-%d").to_string()),
            DateInput::Text(t) => SqlValue::Text(t.to_string()),
        };
        let schema = Schema::new();
        let parser = ConditionParser::new(&schema, &SqliteDialect, &iso, false);
        let mut params = ParamsStore::new(":");
        parser
            .eval(&Condition::field("created", instant), &mut params)
            .unwrap();
        assert_eq!(
            params.get("p1"),
            Some(&SqlValue::Text(String::from("2024-01-01")))
        );

        // Operator payloads bypass the normalizer.
        parser
            .eval(
                &Condition::field("created", CondValue::op(Operator::Lt, instant)),
                &mut params,
            )
            .unwrap();
        assert_eq!(params.get("p2"), Some(&SqlValue::Int(1_704_067_200_000)));
    }

    #[test]
    fn test_strict_mode() {
        let schema = Schema::new().field("data", FieldSpec::string());
        let parser = ConditionParser::new(&schema, &SqliteDialect, &EpochMillis, true);
        let mut params = ParamsStore::new(":");
        assert!(
            parser
                .eval(&Condition::field("data.deep.key", 1), &mut params)
                .is_ok()
        );
        assert!(
            parser
                .eval(&Condition::field("other", 1), &mut params)
                .is_err()
        );
    }
}
