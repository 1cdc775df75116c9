//! Code generation module for the compiler.
//!
//! This module walks completed AST nodes and drives a `Backend`. It handles:
//!
//! - Binding parameter names to backend values for the current function
//! - Generation of literals, variables, binary operators and calls
//! - Prototype declaration and the redefinition and arity rules
//! - Discarding half-built functions so only valid ones stay visible

pub mod compiler;
pub mod expr;
pub mod stmt;

#[cfg(test)]
mod tests;
