//! Contract block parsing: `("requires" | "ensures") (IDENT ":")? expr ";"`.

use stubby_common::token::TokenKind;

use crate::ast::{ContractKind, ContractRecord};
use crate::error::ParseError;

use super::expressions::expr;
use super::Parser;

pub(crate) fn contract_block(p: &mut Parser) -> Result<Vec<ContractRecord>, ParseError> {
    let mut contracts = Vec::new();
    while !p.at(TokenKind::Eof) {
        contracts.push(contract(p)?);
    }
    Ok(contracts)
}

fn contract(p: &mut Parser) -> Result<ContractRecord, ParseError> {
    let kind = match p.current() {
        TokenKind::Requires => ContractKind::Requires,
        TokenKind::Ensures => ContractKind::Ensures,
        _ => return Err(p.error_expected("`requires` or `ensures`")),
    };
    let keyword = p.advance();

    // A name is an identifier directly followed by `:`.
    let name = if p.at(TokenKind::Ident) && p.nth(1) == TokenKind::Colon {
        let name_tok = p.advance();
        p.advance(); // :
        Some(p.text(name_tok.span).to_string())
    } else {
        None
    };

    let expression = expr(p)?;

    if !p.at(TokenKind::Semicolon) {
        return Err(p
            .error_expected("`;`")
            .note(format!("`{kind}` clause starts here"), keyword.span));
    }
    let semi = p.advance();

    Ok(ContractRecord {
        kind,
        name,
        expression,
        span: keyword.span.merge(semi.span),
    })
}
