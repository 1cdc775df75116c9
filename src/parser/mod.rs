//! Parser module for building the Abstract Syntax Tree (AST).
//!
//! Transforms a stream of tokens into AST nodes, one syntactic category
//! per function. Binary expressions use precedence climbing driven by a
//! `PrecedenceTable`; everything else is plain recursive descent:
//!
//! - Top-level parsing (definitions, externs, bare expressions)
//! - Expression parsing (binary ops, calls, literals, parentheses)
//! - Prototype parsing
//!
//! There is no backtracking. A failed parse leaves the cursor where the
//! error was found; recovery is the caller's job.

pub mod expr;
pub mod lookups;
pub mod parser;
pub mod stmt;
