//! Condition trees.
//!
//! A condition tree nests `$or` / `$and` combinators over leaf mappings of
//! field to value:
//!
//! ```rust
//! use oxide_query_core::condition::{Condition, CondValue, Operator};
//!
//! let cond = Condition::or([
//!     Condition::field("status", "open"),
//!     Condition::field("priority", CondValue::op(Operator::Gte, 3)),
//! ]);
//! # let _ = cond;
//! ```
//!
//! Trees are usually read from JSON with [`Condition::from_json`].

mod eval;
mod node;

pub use eval::ConditionParser;
pub use node::{CondValue, Condition, DATE_KEY, Operand, Operator};
