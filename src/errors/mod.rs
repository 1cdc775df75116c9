//! Error types and error handling for the front end.
//!
//! This module defines the error types shared by the parser and the
//! code generation driver. It includes:
//!
//! - Error structures with source position information
//! - Syntax and semantic error variants
//! - Error naming, classification and suggestion tips

pub mod errors;
