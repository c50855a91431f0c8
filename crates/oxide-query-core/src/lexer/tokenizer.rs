//! Search-string tokenizer.

use super::{Span, Token};

/// A whitespace-separated word with its quotes removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Word {
    /// Unquoted, unescaped text.
    pub text: String,
    /// Location in the input, quotes included.
    pub span: Span,
}

/// A lexer that splits a search string into words.
///
/// Quoting follows shell conventions: `'...'` is literal, `"..."` allows
/// `\"` and `\\` escapes, and a backslash outside quotes escapes the next
/// character. Quotes may open in the middle of a word (`name:"john smith"`).
/// An unterminated quote runs to the end of the input.
pub struct Lexer<'a> {
    /// The input search string.
    input: &'a str,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current word.
    start: usize,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            start: 0,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Reads a single-quoted section; the opening quote is already consumed.
    fn scan_single_quoted(&mut self, text: &mut String) {
        while let Some(c) = self.advance() {
            if c == '\'' {
                return;
            }
            text.push(c);
        }
    }

    /// Reads a double-quoted section; the opening quote is already consumed.
    fn scan_double_quoted(&mut self, text: &mut String) {
        while let Some(c) = self.advance() {
            match c {
                '"' => return,
                '\\' => match self.peek() {
                    Some(next @ ('"' | '\\')) => {
                        self.advance();
                        text.push(next);
                    }
                    _ => text.push('\\'),
                },
                _ => text.push(c),
            }
        }
    }

    /// Scans the next word, or returns `None` at the end of input.
    #[must_use]
    pub fn next_word(&mut self) -> Option<Word> {
        self.skip_whitespace();
        self.start = self.pos;
        self.peek()?;

        let mut text = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                break;
            }
            self.advance();
            match c {
                '\'' => self.scan_single_quoted(&mut text),
                '"' => self.scan_double_quoted(&mut text),
                '\\' => {
                    if let Some(next) = self.advance() {
                        text.push(next);
                    }
                }
                _ => text.push(c),
            }
        }

        Some(Word {
            text,
            span: Span::new(self.start, self.pos),
        })
    }
}

impl Iterator for Lexer<'_> {
    type Item = Word;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_word()
    }
}

/// Splits a search string into tokens.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input)
        .map(|word| Token::from_word(&word.text, word.span))
        .collect()
}
