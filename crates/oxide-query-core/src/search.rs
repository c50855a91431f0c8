//! Search-string translation.
//!
//! Each token becomes one clause routed to one of two groups: `?` tokens go
//! to the *any-of* group, everything else to the *all-of* group. The all-of
//! clauses are AND'ed together and the result is OR'ed with the any-of
//! clauses, so `?a:1 b:2 c:3` reads `a = :p1 OR b = :p2 AND c = :p3`.
//!
//! A bare word (no comparator and value) is a free-text term matched against
//! every schema field eligible for free-text search.

use crate::error::Result;
use crate::lexer::{Prefix, Token, tokenize};
use crate::params::ParamsStore;
use crate::resolver::Resolver;
use crate::schema::Schema;

/// Literal written by `field:NULL`.
const NULL_LITERAL: &str = "NULL";

/// Translates search strings.
pub struct SearchParser<'a> {
    resolver: &'a Resolver<'a>,
    schema: &'a Schema,
    strict: bool,
}

impl<'a> SearchParser<'a> {
    /// Creates a parser. In strict mode, named fields must be in the schema.
    #[must_use]
    pub const fn new(resolver: &'a Resolver<'a>, schema: &'a Schema, strict: bool) -> Self {
        Self {
            resolver,
            schema,
            strict,
        }
    }

    /// Translates `input`, binding values into `params`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownField`] in strict mode.
    ///
    /// [`QueryError::UnknownField`]: crate::QueryError::UnknownField
    pub fn parse(&self, input: &str, params: &mut ParamsStore) -> Result<String> {
        let mut any_of: Vec<String> = Vec::new();
        let mut all_of: Vec<String> = Vec::new();

        for token in tokenize(input) {
            tracing::trace!(?token, "search token");
            let clause = self.clause(&token, params)?;
            if clause.is_empty() {
                continue;
            }
            if token.is_optional() {
                any_of.push(clause);
            } else {
                all_of.push(clause);
            }
        }

        any_of.push(all_of.join(" AND "));
        let members: Vec<String> = any_of.into_iter().filter(|c| !c.is_empty()).collect();
        if members.is_empty() {
            return Ok(String::from("TRUE"));
        }
        Ok(members.join(" OR "))
    }

    fn clause(&self, token: &Token, params: &mut ParamsStore) -> Result<String> {
        let Some(value) = token.value.as_deref() else {
            return Ok(self.expand(token, params));
        };

        if self.strict {
            crate::check_identifier(self.schema, &token.field)?;
        }

        if value == NULL_LITERAL {
            let field = &token.field;
            return Ok(if token.prefix == Some(Prefix::Exclude) {
                format!("{field} IS NOT NULL")
            } else {
                format!("{field} IS NULL")
            });
        }

        Ok(self
            .resolver
            .resolve(&token.field, token.comparator, value, token.prefix, params))
    }

    /// Matches a bare term against every free-text field.
    ///
    /// Negated terms must miss every field (AND); others may hit any (OR).
    fn expand(&self, token: &Token, params: &mut ParamsStore) -> String {
        let term = &token.field;
        let clauses: Vec<String> = self
            .schema
            .free_text_fields()
            .map(|field| {
                self.resolver
                    .resolve(field, token.comparator, term, token.prefix, params)
            })
            .collect();

        let joiner = if token.prefix == Some(Prefix::Exclude) {
            " AND "
        } else {
            " OR "
        };
        clauses.join(joiner)
    }
}
