// Stubby lexer -- tokenizer for contract blocks.

mod cursor;

use cursor::Cursor;
use stubby_common::error::{LexError, LexErrorKind};
use stubby_common::span::Span;
use stubby_common::token::{keyword_from_str, Token, TokenKind};

/// Converts contract source text into a stream of tokens.
///
/// Implements `Iterator<Item = Token>`; the final item is always `Eof`.
/// Invalid input becomes an `Error` token and a [`LexError`] retrievable
/// through [`Lexer::errors`], so lexing never stops early.
pub struct Lexer<'src> {
    cursor: Cursor<'src>,
    emitted_eof: bool,
    errors: Vec<LexError>,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            cursor: Cursor::new(source),
            emitted_eof: false,
            errors: Vec::new(),
        }
    }

    /// Tokenize the entire source into a `Vec<Token>`, ending with `Eof`.
    pub fn tokenize(source: &str) -> Vec<Token> {
        Lexer::new(source).collect()
    }

    /// Tokenize the entire source, also returning every lexer error.
    pub fn lex(source: &str) -> (Vec<Token>, Vec<LexError>) {
        let mut lexer = Lexer::new(source);
        let tokens: Vec<Token> = lexer.by_ref().collect();
        (tokens, lexer.errors)
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[LexError] {
        &self.errors
    }

    fn next_token(&mut self) -> Token {
        self.cursor.eat_while(char::is_whitespace);
        let start = self.cursor.pos();
        let Some(c) = self.cursor.advance() else {
            return Token::new(TokenKind::Eof, start, start);
        };

        let kind = match c {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '.' => TokenKind::Dot,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '%' => TokenKind::Percent,
            '<' => self.pick('=', TokenKind::LtEq, TokenKind::Lt),
            '>' => self.pick('=', TokenKind::GtEq, TokenKind::Gt),
            '!' => self.pick('=', TokenKind::NotEq, TokenKind::Bang),
            '&' => self.pick('&', TokenKind::AmpAmp, TokenKind::Amp),
            '|' => self.pick('|', TokenKind::PipePipe, TokenKind::Bar),
            '=' if self.cursor.peek() == Some('=') => {
                self.cursor.advance();
                TokenKind::EqEq
            }
            '/' if self.cursor.peek() == Some('/') => {
                self.cursor.eat_while(|c| c != '\n');
                TokenKind::Comment
            }
            '/' => TokenKind::Slash,
            '0'..='9' => return self.number(start),
            '"' => return self.string(start),
            c if is_ident_start(c) => {
                self.cursor.eat_while(is_ident_continue);
                let text = self.cursor.slice(start, self.cursor.pos());
                keyword_from_str(text).unwrap_or(TokenKind::Ident)
            }
            // A lone `=` lands here too: assignment is not part of the language.
            other => return self.error(LexErrorKind::UnexpectedCharacter(other), start),
        };
        Token::new(kind, start, self.cursor.pos())
    }

    /// Two-character operators: consume `second` if it follows.
    fn pick(&mut self, second: char, pair: TokenKind, single: TokenKind) -> TokenKind {
        if self.cursor.peek() == Some(second) {
            self.cursor.advance();
            pair
        } else {
            single
        }
    }

    fn error(&mut self, kind: LexErrorKind, start: u32) -> Token {
        let end = self.cursor.pos();
        self.errors.push(LexError::new(kind, Span::new(start, end)));
        Token::new(TokenKind::Error, start, end)
    }

    // ── Literals ─────────────────────────────────────────────────────────

    /// Decimal digits with `_` separators, an optional fraction and exponent.
    /// The first digit is already consumed.
    fn number(&mut self, start: u32) -> Token {
        let digits = |c: char| c.is_ascii_digit() || c == '_';
        self.cursor.eat_while(digits);

        let mut kind = TokenKind::IntLiteral;
        // `1.a` is not a float; the dot must be followed by a digit.
        if self.cursor.peek() == Some('.') && self.cursor.peek_next().is_some_and(|c| c.is_ascii_digit()) {
            self.cursor.advance();
            self.cursor.eat_while(digits);
            kind = TokenKind::FloatLiteral;
        }

        if matches!(self.cursor.peek(), Some('e' | 'E')) {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if !self.cursor.peek().is_some_and(|c| c.is_ascii_digit()) {
                let text = self.cursor.slice(start, self.cursor.pos()).to_string();
                return self.error(LexErrorKind::InvalidNumberLiteral(text), start);
            }
            self.cursor.eat_while(digits);
            kind = TokenKind::FloatLiteral;
        }
        Token::new(kind, start, self.cursor.pos())
    }

    /// The raw `"..."` literal; the parser resolves escapes.
    fn string(&mut self, start: u32) -> Token {
        let mut escaped = false;
        while let Some(c) = self.cursor.advance() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => return Token::new(TokenKind::StringLiteral, start, self.cursor.pos()),
                _ => {}
            }
        }
        self.error(LexErrorKind::UnterminatedString, start)
    }
}

impl<'src> Iterator for Lexer<'src> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.emitted_eof {
            return None;
        }
        let token = self.next_token();
        if token.kind == TokenKind::Eof {
            self.emitted_eof = true;
        }
        Some(token)
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
