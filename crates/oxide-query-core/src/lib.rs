//! # oxide-query-core
//!
//! Translates user-facing queries into parameterized SQL boolean expressions.
//!
//! Two query forms are accepted:
//! - a compact **search string** (`title:rust -draft:true ?views>100 cat`)
//! - a nested **condition tree** (`{"$or": [{"a": 1}, {"b": {"$gte": 2}}]}`)
//!
//! Both produce a statement fragment suitable for a `WHERE` clause plus an
//! ordered set of bound values. Values are always bound through placeholders,
//! never written into the statement.
//!
//! ```rust
//! use oxide_query_core::{Condition, FieldSpec, QueryTranslator, Schema};
//! use serde_json::json;
//!
//! let translator = QueryTranslator::new(
//!     Schema::new()
//!         .field("name", FieldSpec::string())
//!         .field("age", FieldSpec::number()),
//! );
//!
//! let out = translator.parse("-name:john").unwrap();
//! assert_eq!(out.statement(), "name NOT LIKE '%'||:p1||'%'");
//!
//! let tree = Condition::from_json(&json!({"a": {"$in": [1, 2, 3]}})).unwrap();
//! let out = translator.parse(tree).unwrap();
//! assert_eq!(out.statement(), "a IN (:p1,:p2,:p3)");
//! ```
//!
//! ## Identifiers
//!
//! Field names are written into the statement as given. They are not
//! validated unless strict mode is enabled
//! ([`QueryTranslator::with_strict`]), in which case every field must be
//! declared in the schema. Callers accepting field names from untrusted input
//! must either enable strict mode or check names against their own allow-list.

pub mod condition;
pub mod date;
pub mod dialect;
pub mod error;
pub mod lexer;
pub mod params;
pub mod projection;
pub mod resolver;
pub mod schema;
pub mod search;
pub mod translator;
pub mod value;

pub use condition::{CondValue, Condition, Operand, Operator};
pub use date::{DateInput, DateNormalizer, EpochMillis};
pub use dialect::{Dialect, SqliteDialect};
pub use error::{QueryError, Result};
pub use params::ParamsStore;
pub use projection::Projection;
pub use schema::{FieldSpec, FieldType, Schema};
pub use translator::{Query, QueryTranslator, Translation, TranslatorOptions};
pub use value::{SqlValue, ToSqlValue};

/// Rejects a field whose column is not declared in `schema`.
///
/// The column is the part before the first `.`, so JSON paths into a declared
/// column are accepted.
pub(crate) fn check_identifier(schema: &Schema, field: &str) -> Result<()> {
    let column = field.split('.').next().unwrap_or(field);
    if schema.contains(column) {
        return Ok(());
    }
    tracing::warn!(field, "rejected field not declared in schema");
    Err(QueryError::UnknownField(field.to_string()))
}
