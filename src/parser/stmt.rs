use log::trace;

use crate::{
    ast::ast::{Function, Prototype},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::{expr::parse_expression, parser::Parser};

/// prototype := identifier '(' identifier* ')'
pub fn parse_prototype(parser: &mut Parser) -> Result<Prototype, Error> {
    trace!("parse_prototype: current token = {}", parser.current_token());

    let name = parser.expect_error(TokenKind::Identifier, |token| {
        ErrorImpl::ExpectedFunctionName { token }
    })?;

    parser.expect_error(TokenKind::Char('('), |token| {
        ErrorImpl::ExpectedPrototypeOpenParen { token }
    })?;

    let mut params = vec![];
    while parser.current_token_kind() == TokenKind::Identifier {
        params.push(parser.advance().value.clone());
    }

    let close = parser.expect_error(TokenKind::Char(')'), |token| {
        ErrorImpl::ExpectedPrototypeCloseParen { token }
    })?;

    Ok(Prototype::new(
        &name.value,
        params,
        Span {
            start: name.span.start,
            end: close.span.end,
        },
    ))
}

/// definition := 'def' prototype expression
pub fn parse_definition(parser: &mut Parser) -> Result<Function, Error> {
    trace!("parse_definition: current token = {}", parser.current_token());

    parser.advance();
    let proto = parse_prototype(parser)?;
    let body = parse_expression(parser)?;

    Ok(Function { proto, body })
}

/// external := 'extern' prototype
pub fn parse_extern(parser: &mut Parser) -> Result<Prototype, Error> {
    trace!("parse_extern: current token = {}", parser.current_token());

    parser.advance();
    parse_prototype(parser)
}

/// toplevelexpr := expression
pub fn parse_top_level_expr(parser: &mut Parser) -> Result<Function, Error> {
    trace!("parse_top_level_expr: current token = {}", parser.current_token());

    let body = parse_expression(parser)?;
    Ok(Function::anonymous(body))
}
