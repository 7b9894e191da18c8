use std::fmt;

use serde::Serialize;

use crate::span::Span;

/// Something the lexer could not turn into a token.
///
/// Lexing continues past errors, so a contract block yields every one of
/// them along with an `Error` token in place of each bad stretch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    pub fn new(kind: LexErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LexErrorKind {
    /// Starts no token: `@`, `#`, or `=` not followed by another `=`.
    UnexpectedCharacter(char),
    UnterminatedString,
    /// Carries the offending text, e.g. `1e+`.
    InvalidNumberLiteral(String),
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            LexErrorKind::UnexpectedCharacter(c) => write!(f, "unexpected character: {c:?}"),
            LexErrorKind::UnterminatedString => f.write_str("unterminated string literal"),
            LexErrorKind::InvalidNumberLiteral(text) => write!(f, "invalid number literal: {text}"),
        }
    }
}

impl std::error::Error for LexError {}
