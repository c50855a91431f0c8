//! Search-string lexer.
//!
//! Splits a raw search string into whitespace-separated words (honoring
//! quotes and backslash escapes) and reads each word as a [`Token`].

mod span;
mod token;
mod tokenizer;

pub use span::Span;
pub use token::{Comparator, Prefix, Token};
pub use tokenizer::{Lexer, Word, tokenize};
