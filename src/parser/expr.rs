use log::trace;

use crate::{
    ast::ast::{Expr, ExprKind},
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::TokenKind,
    Span,
};

use super::parser::Parser;

/// expression := primary (binop primary)*
pub fn parse_expression(parser: &mut Parser) -> Result<Expr, Error> {
    trace!("parse_expression: current token = {}", parser.current_token());

    let lhs = parse_primary(parser)?;
    parse_bin_op_rhs(parser, 0, lhs)
}

pub fn parse_primary(parser: &mut Parser) -> Result<Expr, Error> {
    match parser.current_token_kind() {
        TokenKind::Identifier => parse_identifier_expr(parser),
        TokenKind::Number => parse_number_expr(parser),
        TokenKind::Char('(') => parse_paren_expr(parser),
        _ => Err(parser.error_here(|token| ErrorImpl::UnexpectedToken { token })),
    }
}

pub fn parse_number_expr(parser: &mut Parser) -> Result<Expr, Error> {
    let token = parser.advance().clone();

    Ok(Expr::new(ExprKind::Number(token.number_value()), token.span))
}

/// parenexpr := '(' expression ')'
pub fn parse_paren_expr(parser: &mut Parser) -> Result<Expr, Error> {
    trace!("parse_paren_expr: current token = {}", parser.current_token());

    parser.advance();
    let expr = parse_expression(parser)?;

    parser.expect_error(TokenKind::Char(')'), |token| {
        ErrorImpl::ExpectedCloseParen { token }
    })?;

    Ok(expr)
}

/// identifierexpr := identifier | identifier '(' (expression (',' expression)*)? ')'
pub fn parse_identifier_expr(parser: &mut Parser) -> Result<Expr, Error> {
    trace!("parse_identifier_expr: current token = {}", parser.current_token());

    let ident = parser.advance().clone();

    if !parser.current_token_kind().is_char('(') {
        return Ok(Expr::new(ExprKind::Variable(ident.value), ident.span));
    }

    parser.advance();
    let mut args = vec![];

    if !parser.current_token_kind().is_char(')') {
        loop {
            args.push(parse_expression(parser)?);

            if parser.current_token_kind().is_char(')') {
                break;
            }

            if !parser.current_token_kind().is_char(',') {
                return Err(parser.error_here(|token| ErrorImpl::ExpectedArgumentDelimiter { token }));
            }
            parser.advance();
        }
    }

    let close = parser.advance().clone();

    Ok(Expr::new(
        ExprKind::Call {
            callee: ident.value,
            args,
        },
        Span {
            start: ident.span.start,
            end: close.span.end,
        },
    ))
}

/// Precedence climbing over `(binop primary)*`.
///
/// Folds operators binding at least as tightly as `min_precedence` into
/// `lhs`. Equal precedences associate to the left; a tighter operator to
/// the right of `rhs` is absorbed into `rhs` first.
pub fn parse_bin_op_rhs(parser: &mut Parser, min_precedence: i32, lhs: Expr) -> Result<Expr, Error> {
    let mut lhs = lhs;

    loop {
        let token_precedence = parser.current_precedence();
        if token_precedence < min_precedence || token_precedence < 0 {
            return Ok(lhs);
        }

        let TokenKind::Char(op) = parser.current_token_kind() else {
            return Ok(lhs);
        };
        parser.advance();

        trace!("parse_bin_op_rhs: operator {:?} at precedence {}", op, token_precedence);

        let mut rhs = parse_primary(parser)?;

        let next_precedence = parser.current_precedence();
        if token_precedence < next_precedence {
            rhs = parse_bin_op_rhs(parser, token_precedence + 1, rhs)?;
        }

        lhs = Expr::binary(op, lhs, rhs);
    }
}
