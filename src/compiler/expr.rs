use log::trace;

use crate::{
    ast::ast::{Expr, ExprKind},
    backend::Backend,
    errors::errors::{Error, ErrorImpl},
};

use super::compiler::{backend_error, Compiler};

/// Generates code for the given expression in the current function body.
///
/// Fails on the first semantic error found. Whatever was emitted before the
/// failure is left for the caller to discard along with the function.
pub fn gen_expression<B: Backend>(
    compiler: &mut Compiler<B>,
    expression: &Expr,
) -> Result<B::Value, Error> {
    let position = &expression.get_span().start;

    match &expression.kind {
        ExprKind::Number(value) => compiler
            .backend
            .emit_literal(*value)
            .map_err(|error| backend_error(error, position)),
        ExprKind::Variable(name) => compiler.named_values.get(name).copied().ok_or_else(|| {
            Error::new(
                ErrorImpl::UnknownVariable {
                    variable: name.clone(),
                },
                position.clone(),
            )
        }),
        ExprKind::Binary { op, left, right } => {
            let lhs = gen_expression(compiler, left)?;
            let rhs = gen_expression(compiler, right)?;

            trace!("gen_expression: binary {:?}", op);

            let result = match op {
                '+' => compiler.backend.emit_add(lhs, rhs),
                '-' => compiler.backend.emit_sub(lhs, rhs),
                '*' => compiler.backend.emit_mul(lhs, rhs),
                '<' => compiler.backend.emit_less_than_as_float(lhs, rhs),
                _ => {
                    return Err(Error::new(
                        ErrorImpl::InvalidBinaryOperator { operator: *op },
                        position.clone(),
                    ))
                }
            };

            result.map_err(|error| backend_error(error, position))
        }
        ExprKind::Call { callee, args } => {
            let Some(function) = compiler.backend.lookup_function(callee) else {
                return Err(Error::new(
                    ErrorImpl::UnknownFunction {
                        function: callee.clone(),
                    },
                    position.clone(),
                ));
            };

            let expected = compiler.backend.function_arity(function);
            if expected != args.len() {
                return Err(Error::new(
                    ErrorImpl::IncorrectArgumentCount {
                        function: callee.clone(),
                        expected,
                        received: args.len(),
                    },
                    position.clone(),
                ));
            }

            let mut values = Vec::with_capacity(args.len());
            for arg in args {
                values.push(gen_expression(compiler, arg)?);
            }

            compiler
                .backend
                .emit_call(function, &values)
                .map_err(|error| backend_error(error, position))
        }
    }
}
