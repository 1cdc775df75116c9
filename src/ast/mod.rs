/// AST (Abstract Syntax Tree) module
/// Contains all definitions related to the AST structure
///
/// Submodules:
/// - ast: expression, prototype and function definitions, and their
///   source-like rendering
pub mod ast;
