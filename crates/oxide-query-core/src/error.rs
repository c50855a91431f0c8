//! Error types for query translation.

use thiserror::Error;

/// Errors raised while building or translating a query.
///
/// The translation itself is best-effort and only fails in strict mode. The
/// remaining variants come from turning JSON input into a [`Condition`].
///
/// [`Condition`]: crate::Condition
#[derive(Debug, Error)]
pub enum QueryError {
    /// A field identifier is not declared in the schema (strict mode only).
    #[error("unknown field: {0}")]
    UnknownField(String),

    /// A condition tree node has the wrong shape.
    #[error("invalid condition: {0}")]
    InvalidCondition(String),

    /// A `{"$date": ..}` payload could not be read as an instant.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// A projection is not an object of field flags.
    #[error("invalid projection: {0}")]
    InvalidProjection(String),

    /// Malformed JSON input.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for translation operations.
pub type Result<T> = std::result::Result<T, QueryError>;
