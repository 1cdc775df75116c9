//! Code emission backends.
//!
//! The code generation driver only talks to a `Backend`: a fixed set of
//! emission capabilities over opaque value and function handles. This
//! module defines that interface and its implementations:
//!
//! - `ir`: an in-crate SSA instruction module with a verifier, a printer
//!   and an interpreter for evaluating top-level expressions
//! - `llvm`: the same interface over an LLVM module (feature `llvm`)

use std::fmt::Debug;

use thiserror::Error;

pub mod eval;
pub mod ir;
#[cfg(feature = "llvm")]
pub mod llvm;


#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    #[error("no function body is open for emission")]
    NoInsertPoint,
    #[error("function {0:?} already exists")]
    DuplicateFunction(String),
    #[error("function {0:?} already has a body")]
    AlreadyHasBody(String),
    #[error("function handle no longer refers to a function")]
    StaleFunction,
    #[error("{0}")]
    Builder(String),
    #[error("{0}")]
    Evaluation(String),
}

/// The result of running a top-level expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    pub value: f64,
    /// Text written by the program while it ran (`putchard`, `printd`).
    pub output: String,
}

/// Capabilities the code generation driver needs from a target.
///
/// Values are of the language's single numeric type (a 64-bit float).
/// Handles are opaque; the driver never inspects them.
pub trait Backend {
    type Value: Copy + Debug;
    type Function: Copy + Debug + PartialEq;

    fn emit_literal(&mut self, value: f64) -> Result<Self::Value, BackendError>;

    fn emit_add(&mut self, lhs: Self::Value, rhs: Self::Value) -> Result<Self::Value, BackendError>;

    fn emit_sub(&mut self, lhs: Self::Value, rhs: Self::Value) -> Result<Self::Value, BackendError>;

    fn emit_mul(&mut self, lhs: Self::Value, rhs: Self::Value) -> Result<Self::Value, BackendError>;

    /// Unordered `lhs < rhs`, converted to `0.0` or `1.0`.
    fn emit_less_than_as_float(
        &mut self,
        lhs: Self::Value,
        rhs: Self::Value,
    ) -> Result<Self::Value, BackendError>;

    /// Declares a function taking one number per parameter name and
    /// returning a number.
    fn declare_function(&mut self, name: &str, params: &[String]) -> Result<Self::Function, BackendError>;

    /// Finds a declared or defined function. Anonymous functions are never
    /// found.
    fn lookup_function(&self, name: &str) -> Option<Self::Function>;

    fn function_has_body(&self, function: Self::Function) -> bool;

    fn function_arity(&self, function: Self::Function) -> usize;

    fn function_params(&self, function: Self::Function) -> Vec<Self::Value>;

    /// Opens the entry block of `function`; later emissions go there.
    fn begin_function_body(&mut self, function: Self::Function) -> Result<(), BackendError>;

    fn emit_call(
        &mut self,
        function: Self::Function,
        args: &[Self::Value],
    ) -> Result<Self::Value, BackendError>;

    fn emit_return(&mut self, value: Self::Value) -> Result<(), BackendError>;

    /// Removes `function` from the function table entirely.
    fn abandon_function(&mut self, function: Self::Function);

    /// Drops the body of `function`, leaving it a bodiless declaration.
    /// Existing calls to it stay valid.
    fn discard_body(&mut self, function: Self::Function);

    fn verify_function(&self, function: Self::Function) -> bool;

    /// Renders `function` as text for reporting.
    fn print_function(&self, function: Self::Function) -> String;

    /// Runs a parameterless function. Backends that cannot execute code
    /// return `Ok(None)`.
    fn evaluate(&mut self, _function: Self::Function) -> Result<Option<Evaluation>, BackendError> {
        Ok(None)
    }
}
