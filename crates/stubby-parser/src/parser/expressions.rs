//! Pratt expression parser for contract expressions.
//!
//! Operator precedence comes from binding power tables. Field access is
//! only legal on identifier chains, so `a.b.c` folds into one
//! [`ExprKind::Var`] instead of a tree of accesses.

use stubby_common::span::Span;
use stubby_common::token::TokenKind;

use crate::ast::{BinOp, Expr, ExprKind, Ident, Literal, UnaryOp, VarAccess};
use crate::error::ParseError;

use super::Parser;

// ── Binding Power Tables ───────────────────────────────────────────────

/// Returns (left_bp, right_bp, op) for infix operators.
///
/// Every level is left-associative (left < right).
fn infix_binding_power(op: TokenKind) -> Option<(u8, u8, BinOp)> {
    let entry = match op {
        TokenKind::Or | TokenKind::PipePipe | TokenKind::Bar => (5, 6, BinOp::Or),
        TokenKind::And | TokenKind::AmpAmp | TokenKind::Amp => (7, 8, BinOp::And),

        TokenKind::EqEq => (9, 10, BinOp::Eq),
        TokenKind::NotEq => (9, 10, BinOp::NotEq),

        TokenKind::Lt => (11, 12, BinOp::Lt),
        TokenKind::Gt => (11, 12, BinOp::Gt),
        TokenKind::LtEq => (11, 12, BinOp::LtEq),
        TokenKind::GtEq => (11, 12, BinOp::GtEq),

        TokenKind::Plus => (17, 18, BinOp::Add),
        TokenKind::Minus => (17, 18, BinOp::Sub),

        TokenKind::Star => (19, 20, BinOp::Mul),
        TokenKind::Slash => (19, 20, BinOp::Div),
        TokenKind::Percent => (19, 20, BinOp::Rem),

        _ => return None,
    };
    Some(entry)
}

fn prefix_binding_power(op: TokenKind) -> Option<(u8, UnaryOp)> {
    match op {
        TokenKind::Minus => Some((23, UnaryOp::Neg)),
        TokenKind::Bang | TokenKind::Not => Some((23, UnaryOp::Not)),
        _ => None,
    }
}

/// Call, field access and indexing bind tighter than every prefix and
/// infix operator.
const POSTFIX_BP: u8 = 25;

// ── Expression Entry Point ─────────────────────────────────────────────

pub(crate) fn expr(p: &mut Parser) -> Result<Expr, ParseError> {
    expr_bp(p, 0)
}

fn expr_bp(p: &mut Parser, min_bp: u8) -> Result<Expr, ParseError> {
    let mut lhs = lhs(p)?;

    loop {
        let current = p.current();

        // ── Postfix: call ──
        if current == TokenKind::LParen && POSTFIX_BP >= min_bp {
            let open = p.advance();
            let args = arg_list(p, open.span)?;
            let close = p.advance(); // )
            let span = lhs.span.merge(close.span);
            lhs = Expr::new(
                ExprKind::Call {
                    callee: Box::new(lhs),
                    args,
                },
                span,
            );
            continue;
        }

        // ── Postfix: field access ──
        if current == TokenKind::Dot && POSTFIX_BP >= min_bp {
            let dot = p.advance();
            let name_tok = p.expect(TokenKind::Ident, "field name after `.`")?;
            let field = Ident {
                name: p.text(name_tok.span).to_string(),
                span: name_tok.span,
            };
            let span = lhs.span.merge(field.span);
            lhs = match lhs.kind {
                ExprKind::Var(mut access) => {
                    access.segments.push(field);
                    Expr::new(ExprKind::Var(access), span)
                }
                _ => {
                    let message = "field access is only supported on variable chains";
                    return Err(
                        ParseError::new(message, dot.span).note("this is not a variable", lhs.span)
                    );
                }
            };
            continue;
        }

        // ── Postfix: index ──
        if current == TokenKind::LBracket && POSTFIX_BP >= min_bp {
            let open = p.advance();
            let index = expr_bp(p, 0)?;
            if !p.at(TokenKind::RBracket) {
                return Err(p.error_expected("`]`").note("opened here", open.span));
            }
            let close = p.advance();
            let span = lhs.span.merge(close.span);
            lhs = Expr::new(
                ExprKind::Index {
                    base: Box::new(lhs),
                    index: Box::new(index),
                },
                span,
            );
            continue;
        }

        // ── Infix operators ──
        if let Some((l_bp, r_bp, op)) = infix_binding_power(current) {
            if l_bp < min_bp {
                break;
            }
            p.advance(); // operator
            let rhs = expr_bp(p, r_bp)?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr::new(
                ExprKind::Binary {
                    op,
                    lhs: Box::new(lhs),
                    rhs: Box::new(rhs),
                },
                span,
            );
            continue;
        }

        break;
    }

    Ok(lhs)
}

// ── Atom / Prefix Parsing (LHS) ───────────────────────────────────────

fn lhs(p: &mut Parser) -> Result<Expr, ParseError> {
    let current = p.current();

    if let Some((r_bp, op)) = prefix_binding_power(current) {
        let op_tok = p.advance();
        let operand = expr_bp(p, r_bp)?;
        let span = op_tok.span.merge(operand.span);
        return Ok(Expr::new(
            ExprKind::Unary {
                op,
                operand: Box::new(operand),
            },
            span,
        ));
    }

    match current {
        TokenKind::IntLiteral => {
            let tok = p.advance();
            let digits: String = p.text(tok.span).chars().filter(|&c| c != '_').collect();
            let value = digits
                .parse::<i64>()
                .map_err(|_| ParseError::new("integer literal out of range", tok.span))?;
            Ok(literal(Literal::Int(value), tok.span))
        }

        TokenKind::FloatLiteral => {
            let tok = p.advance();
            let digits: String = p.text(tok.span).chars().filter(|&c| c != '_').collect();
            let value = digits
                .parse::<f64>()
                .map_err(|_| ParseError::new("invalid float literal", tok.span))?;
            Ok(literal(Literal::Float(value), tok.span))
        }

        TokenKind::True | TokenKind::False => {
            let tok = p.advance();
            Ok(literal(Literal::Bool(tok.kind == TokenKind::True), tok.span))
        }

        TokenKind::Null => {
            let tok = p.advance();
            Ok(literal(Literal::Null, tok.span))
        }

        TokenKind::StringLiteral => {
            let tok = p.advance();
            let raw = p.text(tok.span);
            let inner = &raw[1..raw.len() - 1];
            Ok(literal(Literal::Str(unescape(inner)), tok.span))
        }

        TokenKind::Ident => {
            let tok = p.advance();
            let root = Ident {
                name: p.text(tok.span).to_string(),
                span: tok.span,
            };
            Ok(Expr::new(
                ExprKind::Var(VarAccess {
                    segments: vec![root],
                }),
                tok.span,
            ))
        }

        TokenKind::LParen => {
            let open = p.advance();
            let inner = expr_bp(p, 0)?;
            if !p.at(TokenKind::RParen) {
                return Err(p.error_expected("`)`").note("opened here", open.span));
            }
            let close = p.advance();
            Ok(Expr::new(inner.kind, open.span.merge(close.span)))
        }

        _ => Err(p.error_expected("expression")),
    }
}

/// Parse `arg, arg, ...` up to (not including) the closing `)`.
fn arg_list(p: &mut Parser, open: Span) -> Result<Vec<Expr>, ParseError> {
    let mut args = Vec::new();
    while !p.at(TokenKind::RParen) {
        args.push(expr_bp(p, 0)?);
        if p.at(TokenKind::Comma) {
            p.advance();
        } else if !p.at(TokenKind::RParen) {
            return Err(p
                .error_expected("`,` or `)`")
                .note("argument list opened here", open));
        }
    }
    Ok(args)
}

fn literal(lit: Literal, span: Span) -> Expr {
    Expr::new(ExprKind::Literal(lit), span)
}

/// Resolve `\"`, `\\`, `\n`, `\t`, `\r`. Other escapes are kept verbatim so
/// regex classes like `\d` survive.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('"') => out.push('"'),
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
