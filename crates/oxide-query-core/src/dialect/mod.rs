//! SQL Dialect support.
//!
//! The translator writes placeholders, substring matches and JSON-path
//! lookups through this trait. SQLite is the only dialect implemented; other
//! databases plug in by implementing [`Dialect`].

mod sqlite;

pub use sqlite::SqliteDialect;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the prefix written before a named parameter (e.g. `:` for `:p1`).
    fn parameter_sigil(&self) -> &'static str {
        ":"
    }

    /// Returns the identifier quote character.
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the string concatenation operator.
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Wraps a bound placeholder so that it matches anywhere inside a value.
    fn substring_pattern(&self, placeholder: &str) -> String {
        let concat = self.concat_operator();
        format!("'%'{concat}{placeholder}{concat}'%'")
    }

    /// Builds an expression reading `path` out of the JSON stored in `column`.
    fn json_extract(&self, column: &str, path: &[&str]) -> String;
}

/// Looks up a dialect by name.
#[must_use]
pub fn dialect_for(name: &str) -> Option<Box<dyn Dialect>> {
    match name.to_ascii_lowercase().as_str() {
        "sqlite" => Some(Box::new(SqliteDialect::new())),
        _ => None,
    }
}
