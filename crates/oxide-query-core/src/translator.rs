//! Translator facade.
//!
//! [`QueryTranslator`] owns the configuration (dialect, schema, date
//! normalizer, strict mode, reference instant) and hands every call a fresh
//! [`ParamsStore`], so one translator can serve any number of threads.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::condition::{Condition, ConditionParser};
use crate::date::{DateNormalizer, EpochMillis};
use crate::dialect::{Dialect, SqliteDialect};
use crate::error::Result;
use crate::params::ParamsStore;
use crate::projection::Projection;
use crate::resolver::Resolver;
use crate::schema::Schema;
use crate::search::SearchParser;
use crate::value::SqlValue;

/// Configuration of a [`QueryTranslator`].
pub struct TranslatorOptions {
    /// Target dialect. Defaults to SQLite.
    pub dialect: Box<dyn Dialect>,
    /// Field descriptors. Defaults to an empty schema.
    pub schema: Schema,
    /// Reject field identifiers missing from the schema.
    pub strict: bool,
    /// Reference instant for relative dates; read from the clock when unset.
    pub now: Option<DateTime<Utc>>,
    /// Strategy turning dates into bound values. Defaults to [`EpochMillis`].
    pub normalizer: Box<dyn DateNormalizer>,
}

impl Default for TranslatorOptions {
    fn default() -> Self {
        Self {
            dialect: Box::new(SqliteDialect::new()),
            schema: Schema::new(),
            strict: false,
            now: None,
            normalizer: Box::new(EpochMillis),
        }
    }
}

impl fmt::Debug for TranslatorOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslatorOptions")
            .field("dialect", &self.dialect.name())
            .field("schema", &self.schema)
            .field("strict", &self.strict)
            .field("now", &self.now)
            .finish_non_exhaustive()
    }
}

/// Input accepted by [`QueryTranslator::parse`].
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    /// A search string such as `title:rust -draft:true`.
    Search(String),
    /// A condition tree.
    Condition(Condition),
}

impl Query {
    /// Reads a query from JSON: a string is a search, anything else a
    /// condition tree.
    ///
    /// # Errors
    ///
    /// Returns an error if a non-string value is not a valid condition tree.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(Self::Search(s.clone())),
            other => Condition::from_json(other).map(Self::Condition),
        }
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Self::Search(s.to_string())
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Self::Search(s)
    }
}

impl From<Condition> for Query {
    fn from(c: Condition) -> Self {
        Self::Condition(c)
    }
}

/// A translated query: a boolean SQL expression and its bound values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Translation {
    statement: String,
    #[serde(rename = "bindings")]
    params: ParamsStore,
}

impl Translation {
    /// The SQL boolean expression.
    #[must_use]
    pub fn statement(&self) -> &str {
        &self.statement
    }

    /// The parameter store the statement was bound against.
    #[must_use]
    pub const fn params(&self) -> &ParamsStore {
        &self.params
    }

    /// Placeholder name to value, in binding order.
    #[must_use]
    pub fn bindings(&self) -> &[(String, SqlValue)] {
        self.params.bindings()
    }

    /// Splits into statement and parameters.
    #[must_use]
    pub fn into_parts(self) -> (String, ParamsStore) {
        (self.statement, self.params)
    }
}

/// Translates search strings and condition trees into SQL.
///
/// ```rust
/// use oxide_query_core::{FieldSpec, QueryTranslator, Schema, SqlValue};
///
/// let schema = Schema::new()
///     .field("name", FieldSpec::string())
///     .field("age", FieldSpec::number());
/// let translator = QueryTranslator::new(schema);
///
/// let out = translator.parse("name:john age>5").unwrap();
/// assert_eq!(out.statement(), "name LIKE '%'||:p1||'%' AND age > :p2");
/// assert_eq!(out.params().get("p2"), Some(&SqlValue::Int(5)));
/// ```
#[derive(Debug, Default)]
pub struct QueryTranslator {
    options: TranslatorOptions,
}

impl QueryTranslator {
    /// Creates a SQLite translator over `schema`.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self::from_options(TranslatorOptions {
            schema,
            ..TranslatorOptions::default()
        })
    }

    /// Creates a translator from explicit options.
    #[must_use]
    pub const fn from_options(options: TranslatorOptions) -> Self {
        Self { options }
    }

    /// Sets the target dialect.
    #[must_use]
    pub fn with_dialect(mut self, dialect: Box<dyn Dialect>) -> Self {
        self.options.dialect = dialect;
        self
    }

    /// Enables or disables strict field checking.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.options.strict = strict;
        self
    }

    /// Sets the strategy that turns dates into bound values.
    #[must_use]
    pub fn with_date_normalizer(mut self, normalizer: impl DateNormalizer + 'static) -> Self {
        self.options.normalizer = Box::new(normalizer);
        self
    }

    /// Pins the instant relative dates (`NOW`, `-1d`, ...) are measured from.
    #[must_use]
    pub const fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.options.now = Some(now);
        self
    }

    /// Returns the target dialect.
    #[must_use]
    pub fn dialect(&self) -> &dyn Dialect {
        self.options.dialect.as_ref()
    }

    /// Returns the schema.
    #[must_use]
    pub const fn schema(&self) -> &Schema {
        &self.options.schema
    }

    /// Returns true if unknown fields are rejected.
    #[must_use]
    pub const fn is_strict(&self) -> bool {
        self.options.strict
    }

    /// Translates a search string or a condition tree.
    ///
    /// # Errors
    ///
    /// Only fails in strict mode, with [`QueryError::UnknownField`].
    ///
    /// [`QueryError::UnknownField`]: crate::QueryError::UnknownField
    pub fn parse(&self, query: impl Into<Query>) -> Result<Translation> {
        match query.into() {
            Query::Search(q) => self.parse_search(&q),
            Query::Condition(c) => self.parse_condition(&c),
        }
    }

    /// Translates a search string.
    ///
    /// # Errors
    ///
    /// Only fails in strict mode, with [`QueryError::UnknownField`].
    ///
    /// [`QueryError::UnknownField`]: crate::QueryError::UnknownField
    pub fn parse_search(&self, input: &str) -> Result<Translation> {
        let now = self.options.now.unwrap_or_else(Utc::now);
        let resolver = Resolver::new(
            &self.options.schema,
            self.dialect(),
            self.options.normalizer.as_ref(),
            now,
        );
        let parser = SearchParser::new(&resolver, &self.options.schema, self.options.strict);

        let mut params = self.params();
        let statement = parser.parse(input, &mut params)?;
        Ok(finish("search", statement, params))
    }

    /// Translates a condition tree.
    ///
    /// # Errors
    ///
    /// Only fails in strict mode, with [`QueryError::UnknownField`].
    ///
    /// [`QueryError::UnknownField`]: crate::QueryError::UnknownField
    pub fn parse_condition(&self, condition: &Condition) -> Result<Translation> {
        let parser = ConditionParser::new(
            &self.options.schema,
            self.dialect(),
            self.options.normalizer.as_ref(),
            self.options.strict,
        );

        let mut params = self.params();
        let statement = parser.eval(condition, &mut params)?;
        Ok(finish("condition", statement, params))
    }

    /// Formats a projection as a quoted column list.
    #[must_use]
    pub fn select(&self, projection: &Projection) -> String {
        projection.to_sql(self.dialect().identifier_quote())
    }

    fn params(&self) -> ParamsStore {
        ParamsStore::new(self.dialect().parameter_sigil())
    }
}

fn finish(kind: &str, statement: String, params: ParamsStore) -> Translation {
    tracing::debug!(kind, %statement, bindings = params.len(), "translated query");
    Translation { statement, params }
}
