//! Errors raised while reading a contract block.

use std::fmt;

use stubby_common::error::LexError;
use stubby_common::span::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub message: String,
    /// Where the parser stopped.
    pub span: Span,
    /// A second location worth pointing at, such as the `(` that was never
    /// closed or the keyword of an unfinished clause.
    pub related: Option<(String, Span)>,
}

impl ParseError {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
            related: None,
        }
    }

    /// Attach a secondary location to the error.
    pub fn note(mut self, message: impl Into<String>, span: Span) -> Self {
        self.related = Some((message.into(), span));
        self
    }
}

impl From<LexError> for ParseError {
    fn from(err: LexError) -> Self {
        ParseError::new(err.to_string(), err.span)
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;
    use stubby_common::error::LexErrorKind;

    #[test]
    fn note_points_at_the_opening_delimiter() {
        let err = ParseError::new("expected `)`", Span::new(9, 10)).note("opened here", Span::new(0, 1));
        assert_eq!(err.to_string(), "expected `)`");
        assert_eq!(err.related, Some(("opened here".to_string(), Span::new(0, 1))));
    }

    #[test]
    fn lex_errors_keep_message_and_span() {
        let err: ParseError =
            LexError::new(LexErrorKind::UnterminatedString, Span::new(3, 8)).into();
        assert_eq!(err.message, "unterminated string literal");
        assert_eq!(err.span, Span::new(3, 8));
        assert!(err.related.is_none());
    }
}
