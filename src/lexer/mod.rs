//! Lexical analysis module.
//!
//! Converts source text into a stream of tokens for the parser:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Recognition of the `def` and `extern` keywords, identifiers and numbers
//! - Every other character passed through as a single-character token
//! - Token position tracking for error reporting
//! - `#` comments and whitespace skipping

pub mod lexer;
pub mod tokens;
