//! Token-stream parser for contract blocks.
//!
//! The parser works over the lexer's tokens with comments already removed
//! and stops at the first error. Expressions use Pratt parsing
//! ([`expressions`]); clause structure is handled in [`contracts`].

pub(crate) mod contracts;
pub(crate) mod expressions;

use stubby_common::span::Span;
use stubby_common::token::{Token, TokenKind};

use crate::error::ParseError;

pub(crate) struct Parser<'src> {
    /// Significant tokens only, always ending with `Eof`.
    tokens: Vec<Token>,
    pos: usize,
    source: &'src str,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(tokens: Vec<Token>, source: &'src str) -> Self {
        let tokens = tokens
            .into_iter()
            .filter(|t| !t.kind.is_trivia())
            .collect();
        Self {
            tokens,
            pos: 0,
            source,
        }
    }

    // ── Lookahead ──────────────────────────────────────────────────────

    pub(crate) fn current(&self) -> TokenKind {
        self.nth(0)
    }

    /// Kind of the Nth token ahead; `Eof` past the end.
    pub(crate) fn nth(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.pos + n)
            .map(|t| t.kind)
            .unwrap_or(TokenKind::Eof)
    }

    pub(crate) fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some(tok) => tok.span,
            None => {
                let end = self.source.len() as u32;
                Span::new(end, end)
            }
        }
    }

    pub(crate) fn current_text(&self) -> &'src str {
        self.text(self.current_span())
    }

    pub(crate) fn text(&self, span: Span) -> &'src str {
        &self.source[span.start as usize..span.end as usize]
    }

    pub(crate) fn at(&self, kind: TokenKind) -> bool {
        self.current() == kind
    }

    // ── Consumption ────────────────────────────────────────────────────

    /// Consume the current token. At `Eof` the position does not move.
    pub(crate) fn advance(&mut self) -> Token {
        let span = self.current_span();
        let token = Token {
            kind: self.current(),
            span,
        };
        if self.pos < self.tokens.len() && token.kind != TokenKind::Eof {
            self.pos += 1;
        }
        token
    }

    /// Consume a token of the given kind or fail with "expected {what}".
    pub(crate) fn expect(&mut self, kind: TokenKind, what: &str) -> Result<Token, ParseError> {
        if self.at(kind) {
            Ok(self.advance())
        } else {
            Err(self.error_expected(what))
        }
    }

    /// "expected X, found `text`" at the current token.
    pub(crate) fn error_expected(&self, what: &str) -> ParseError {
        let found = if self.at(TokenKind::Eof) {
            "end of input".to_string()
        } else {
            format!("`{}`", self.current_text())
        };
        ParseError::new(format!("expected {what}, found {found}"), self.current_span())
    }
}
