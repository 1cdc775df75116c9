//! Session configuration shared by the library and the `toy` binary.

use thiserror::Error;

use crate::parser::lookups::PrecedenceTable;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("operator {0:?} must have the form <char>=<precedence>")]
    MalformedOperator(String),
    #[error("operator {0:?} must be a single ASCII character")]
    InvalidOperatorChar(String),
    #[error("precedence {0:?} is not an integer")]
    InvalidPrecedence(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Name given to the backend module
    pub module_name: String,
    /// Extra binary operators installed on top of the default table
    pub operators: Vec<(char, i32)>,
    /// Whether generated functions are included in reports
    pub print_ir: bool,
    /// Whether top-level expressions are run after generation
    pub evaluate: bool,
    /// Nesting limit for calls made while evaluating
    pub max_call_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            module_name: String::from("toy jit"),
            operators: vec![],
            print_ir: true,
            evaluate: true,
            max_call_depth: 256,
        }
    }
}

impl Config {
    /// Installs the configured operators into `table`.
    pub fn extend_precedence(&self, table: &mut PrecedenceTable) {
        for (op, precedence) in &self.operators {
            table.set(*op, *precedence);
        }
    }
}

/// Parses an operator override written as `<char>=<precedence>`, e.g. `/=40`.
pub fn parse_operator(input: &str) -> Result<(char, i32), ConfigError> {
    // The operator itself may be '=', so split on the last one.
    let (op, precedence) = input
        .rsplit_once('=')
        .ok_or_else(|| ConfigError::MalformedOperator(String::from(input)))?;

    let mut chars = op.chars();
    let op = match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => c,
        (None, _) => return Err(ConfigError::MalformedOperator(String::from(input))),
        _ => return Err(ConfigError::InvalidOperatorChar(String::from(op))),
    };

    let precedence = precedence
        .trim()
        .parse::<i32>()
        .map_err(|_| ConfigError::InvalidPrecedence(String::from(precedence)))?;

    Ok((op, precedence))
}
