//! Search tokens.

use std::fmt;

use super::Span;

/// Leading operator on a search token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prefix {
    /// `+`: exact equality.
    Require,
    /// `-`: negation.
    Exclude,
    /// `?`: the clause is OR'ed with the rest of the query.
    Optional,
}

impl Prefix {
    /// Reads a prefix character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(Self::Require),
            '-' => Some(Self::Exclude),
            '?' => Some(Self::Optional),
            _ => None,
        }
    }

    /// Returns the prefix character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Require => '+',
            Self::Exclude => '-',
            Self::Optional => '?',
        }
    }
}

/// Separator between a field and its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparator {
    /// `:`
    Colon,
    /// `>`
    Gt,
    /// `<`
    Lt,
}

impl Comparator {
    /// Reads a comparator character.
    #[must_use]
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            ':' => Some(Self::Colon),
            '>' => Some(Self::Gt),
            '<' => Some(Self::Lt),
            _ => None,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Colon => write!(f, ":"),
            Self::Gt => write!(f, ">"),
            Self::Lt => write!(f, "<"),
        }
    }
}

/// One search token: `[prefix]field[comparator value]`.
///
/// A token without comparator and value is *bare*: its `field` slot holds a
/// free-text term rather than a field name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// Optional leading operator.
    pub prefix: Option<Prefix>,
    /// Field name, or the search term of a bare token.
    pub field: String,
    /// Comparator, present together with `value`.
    pub comparator: Option<Comparator>,
    /// Raw value text, never empty when present.
    pub value: Option<String>,
    /// Location of the word in the search string.
    pub span: Span,
}

impl Token {
    /// Reads an unquoted word.
    ///
    /// The body after the prefix is split on the first `:`, `>` or `<`. When
    /// that character ends the word there is no value and the whole body is
    /// kept as a bare term.
    #[must_use]
    pub fn from_word(text: &str, span: Span) -> Self {
        let mut chars = text.chars();
        let prefix = chars.next().and_then(Prefix::from_char);
        let body = if prefix.is_some() { chars.as_str() } else { text };

        let split = body
            .char_indices()
            .find_map(|(idx, c)| Comparator::from_char(c).map(|cmp| (idx, cmp)))
            .filter(|(idx, _)| idx + 1 < body.len());

        match split {
            Some((idx, comparator)) => Self {
                prefix,
                field: body[..idx].to_string(),
                comparator: Some(comparator),
                value: Some(body[idx + 1..].to_string()),
                span,
            },
            None => Self {
                prefix,
                field: body.to_string(),
                comparator: None,
                value: None,
                span,
            },
        }
    }

    /// Returns true for a free-text token.
    #[must_use]
    pub const fn is_bare(&self) -> bool {
        self.value.is_none()
    }

    /// Returns true for the optional (`?`) prefix.
    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.prefix == Some(Prefix::Optional)
    }
}
