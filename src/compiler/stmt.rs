use log::debug;

use crate::{
    ast::ast::{Function, Prototype},
    backend::Backend,
    errors::errors::{Error, ErrorImpl},
};

use super::{
    compiler::{backend_error, Compiler},
    expr::gen_expression,
};

/// Declares the function described by `proto`.
///
/// A function already known under the same name is reused when its
/// parameter count matches, so an `extern` may be repeated and a later
/// `def` can complete it.
pub fn gen_prototype<B: Backend>(
    compiler: &mut Compiler<B>,
    proto: &Prototype,
) -> Result<B::Function, Error> {
    if let Some(function) = compiler.backend.lookup_function(&proto.name) {
        let expected = compiler.backend.function_arity(function);
        if expected != proto.arity() {
            return Err(Error::new(
                ErrorImpl::PrototypeMismatch {
                    function: proto.name.clone(),
                    expected,
                    received: proto.arity(),
                },
                proto.span.start.clone(),
            ));
        }

        return Ok(function);
    }

    compiler
        .backend
        .declare_function(&proto.name, &proto.params)
        .map_err(|error| backend_error(error, &proto.span.start))
}

/// Generates a complete function: declaration, body and return.
///
/// A function that already has a body cannot be defined again. If the body
/// fails to generate or verify, a function declared here is removed from
/// the backend entirely, while one completing an earlier `extern` goes back
/// to being a declaration so existing callers stay valid.
pub fn gen_function<B: Backend>(
    compiler: &mut Compiler<B>,
    function: &Function,
) -> Result<B::Function, Error> {
    let proto = &function.proto;
    let declared_earlier = compiler.backend.lookup_function(&proto.name).is_some();
    let handle = gen_prototype(compiler, proto)?;

    if compiler.backend.function_has_body(handle) {
        return Err(Error::new(
            ErrorImpl::FunctionRedefinition {
                function: proto.name.clone(),
            },
            proto.span.start.clone(),
        ));
    }

    let result = gen_body(compiler, function, handle);
    compiler.named_values.clear();

    match result {
        Ok(()) => {
            debug!("generated function {:?}", proto.name);
            Ok(handle)
        }
        Err(error) if declared_earlier => {
            debug!("discarding body of {:?}: {}", proto.name, error);
            compiler.backend.discard_body(handle);
            Err(error)
        }
        Err(error) => {
            debug!("abandoning function {:?}: {}", proto.name, error);
            compiler.backend.abandon_function(handle);
            Err(error)
        }
    }
}

fn gen_body<B: Backend>(
    compiler: &mut Compiler<B>,
    function: &Function,
    handle: B::Function,
) -> Result<(), Error> {
    let position = &function.proto.span.start;

    compiler
        .backend
        .begin_function_body(handle)
        .map_err(|error| backend_error(error, position))?;

    // Duplicate parameter names shadow earlier ones.
    compiler.named_values.clear();
    let params = compiler.backend.function_params(handle);
    for (name, value) in function.proto.params.iter().zip(params) {
        compiler.named_values.insert(name.clone(), value);
    }

    let value = gen_expression(compiler, &function.body)?;
    compiler
        .backend
        .emit_return(value)
        .map_err(|error| backend_error(error, position))?;

    if !compiler.backend.verify_function(handle) {
        return Err(Error::new(
            ErrorImpl::InvalidFunction {
                function: function.proto.name.clone(),
            },
            position.clone(),
        ));
    }

    Ok(())
}
