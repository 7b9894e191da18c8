use serde::Serialize;

use crate::span::Span;

/// A token of the contract expression language.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    /// Create a new token from a kind and byte offsets.
    pub fn new(kind: TokenKind, start: u32, end: u32) -> Self {
        Self {
            kind,
            span: Span::new(start, end),
        }
    }
}

/// Every kind of token in the contract language.
///
/// The vocabulary is deliberately small: contract blocks are sequences of
/// `requires`/`ensures` clauses over field-access chains, literals and the
/// usual boolean and arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // ── Keywords (8) ───────────────────────────────────────────────────
    Requires,
    Ensures,
    True,
    False,
    Null,
    And,
    Or,
    Not,

    // ── Operators (16) ─────────────────────────────────────────────────
    /// `+`
    Plus,
    /// `-`
    Minus,
    /// `*`
    Star,
    /// `/`
    Slash,
    /// `%`
    Percent,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    LtEq,
    /// `>=`
    GtEq,
    /// `&&`
    AmpAmp,
    /// `||`
    PipePipe,
    /// `&`, accepted as logical and
    Amp,
    /// `|`, accepted as logical or
    Bar,
    /// `!`
    Bang,

    // ── Delimiters (4) ─────────────────────────────────────────────────
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,

    // ── Punctuation (4) ────────────────────────────────────────────────
    /// `,`
    Comma,
    /// `.`
    Dot,
    /// `:`
    Colon,
    /// `;`
    Semicolon,

    // ── Literals (3) ───────────────────────────────────────────────────
    /// Integer literal, e.g. `42`, `1_000`.
    IntLiteral,
    /// Floating-point literal, e.g. `3.14`, `1.5e-2`.
    FloatLiteral,
    /// A complete double-quoted string, quotes included.
    StringLiteral,

    // ── Identifiers and comments (2) ───────────────────────────────────
    Ident,
    /// `// ...` line comment. Skipped by the parser.
    Comment,

    // ── Special (2) ────────────────────────────────────────────────────
    Eof,
    /// Invalid input. The lexer records a matching `LexError`.
    Error,
}

impl TokenKind {
    /// Whether the parser should skip this token entirely.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Comment)
    }
}

/// Look up a keyword from its string representation.
pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
    match s {
        "requires" => Some(TokenKind::Requires),
        "ensures" => Some(TokenKind::Ensures),
        "true" => Some(TokenKind::True),
        "false" => Some(TokenKind::False),
        "null" => Some(TokenKind::Null),
        "and" => Some(TokenKind::And),
        "or" => Some(TokenKind::Or),
        "not" => Some(TokenKind::Not),
        _ => None,
    }
}
