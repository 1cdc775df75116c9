//! Main compiler module.
//!
//! This module contains the `Compiler` structure that pairs a backend with
//! the binding scope of the function currently being generated.

use std::collections::HashMap;

use crate::{
    backend::{Backend, BackendError},
    errors::errors::{Error, ErrorImpl},
    Position,
};

/// The state of code generation.
///
/// The backend owns every declared function. The binding scope only
/// exists while a function body is being generated and is rebuilt from
/// the prototype's parameters each time.
///
/// # Type Parameters
///
/// * `B` - The backend that instructions are emitted into
pub struct Compiler<B: Backend> {
    /// The backend receiving generated code
    pub backend: B,
    /// Map of parameter names to their backend values
    pub named_values: HashMap<String, B::Value>,
}

impl<B: Backend> Compiler<B> {
    pub fn new(backend: B) -> Self {
        Compiler {
            backend,
            named_values: HashMap::new(),
        }
    }

    pub fn get_backend(&self) -> &B {
        &self.backend
    }

    pub fn get_backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Consumes the compiler, returning its backend.
    pub fn into_backend(self) -> B {
        self.backend
    }
}

/// Converts a backend failure into a located error.
pub fn backend_error(error: BackendError, position: &Position) -> Error {
    let error_impl = match error {
        BackendError::Evaluation(message) => ErrorImpl::Evaluation { message },
        other => ErrorImpl::Backend {
            message: other.to_string(),
        },
    };

    Error::new(error_impl, position.clone())
}
