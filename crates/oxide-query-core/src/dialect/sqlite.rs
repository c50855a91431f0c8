//! SQLite dialect implementation.

use super::Dialect;

/// SQLite dialect.
///
/// Parameters are named (`:p1`) and JSON columns are read with the
/// [`json_extract`](https://www.sqlite.org/json1.html#jex) function.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn json_extract(&self, column: &str, path: &[&str]) -> String {
        format!("json_extract({column}, '$.{}')", path.join("."))
    }
}
