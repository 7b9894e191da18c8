//! Stubby parser: contract expressions and `requires`/`ensures` blocks.
//!
//! Lexes with `stubby-lexer` and builds the owned AST in [`ast`]. Parsing
//! stops at the first error, lexer errors included.

pub mod ast;
pub mod error;
mod parser;

use stubby_common::token::TokenKind;
use stubby_lexer::Lexer;

pub use ast::{
    BinOp, ContractKind, ContractRecord, Expr, ExprKind, Ident, Literal, UnaryOp, VarAccess,
    REGEX_ENSURES,
};
pub use error::ParseError;

use parser::Parser;

/// Parse a single expression spanning the whole source.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let mut p = parser_for(source)?;
    let expr = parser::expressions::expr(&mut p)?;
    if !p.at(TokenKind::Eof) {
        return Err(p.error_expected("end of expression"));
    }
    Ok(expr)
}

/// Parse a block of contract clauses. An empty source yields no contracts.
pub fn parse_contracts(source: &str) -> Result<Vec<ContractRecord>, ParseError> {
    let mut p = parser_for(source)?;
    parser::contracts::contract_block(&mut p)
}

fn parser_for(source: &str) -> Result<Parser<'_>, ParseError> {
    let (tokens, errors) = Lexer::lex(source);
    if let Some(first) = errors.into_iter().next() {
        return Err(first.into());
    }
    Ok(Parser::new(tokens, source))
}
