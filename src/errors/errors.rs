use std::fmt::Display;

use thiserror::Error;

use crate::Position;

/// Which stage of the pipeline rejected the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Syntax,
    Semantic,
}

#[derive(Debug, Clone)]
pub struct Error {
    internal_error: ErrorImpl,
    position: Position,
}

impl Error {
    pub fn new(error_impl: ErrorImpl, position: Position) -> Self {
        Error {
            internal_error: error_impl,
            position,
        }
    }

    pub fn get_position(&self) -> &Position {
        &self.position
    }

    pub fn get_impl(&self) -> &ErrorImpl {
        &self.internal_error
    }

    pub fn get_error_name(&self) -> &str {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { .. } => "UnexpectedToken",
            ErrorImpl::ExpectedCloseParen { .. } => "ExpectedCloseParen",
            ErrorImpl::ExpectedArgumentDelimiter { .. } => "ExpectedArgumentDelimiter",
            ErrorImpl::ExpectedFunctionName { .. } => "ExpectedFunctionName",
            ErrorImpl::ExpectedPrototypeOpenParen { .. } => "ExpectedPrototypeOpenParen",
            ErrorImpl::ExpectedPrototypeCloseParen { .. } => "ExpectedPrototypeCloseParen",
            ErrorImpl::UnknownVariable { .. } => "UnknownVariable",
            ErrorImpl::InvalidBinaryOperator { .. } => "InvalidBinaryOperator",
            ErrorImpl::UnknownFunction { .. } => "UnknownFunction",
            ErrorImpl::IncorrectArgumentCount { .. } => "IncorrectArgumentCount",
            ErrorImpl::PrototypeMismatch { .. } => "PrototypeMismatch",
            ErrorImpl::FunctionRedefinition { .. } => "FunctionRedefinition",
            ErrorImpl::InvalidFunction { .. } => "InvalidFunction",
            ErrorImpl::Backend { .. } => "Backend",
            ErrorImpl::Evaluation { .. } => "Evaluation",
        }
    }

    pub fn get_class(&self) -> ErrorClass {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { .. }
            | ErrorImpl::ExpectedCloseParen { .. }
            | ErrorImpl::ExpectedArgumentDelimiter { .. }
            | ErrorImpl::ExpectedFunctionName { .. }
            | ErrorImpl::ExpectedPrototypeOpenParen { .. }
            | ErrorImpl::ExpectedPrototypeCloseParen { .. } => ErrorClass::Syntax,
            _ => ErrorClass::Semantic,
        }
    }

    pub fn is_syntax(&self) -> bool {
        self.get_class() == ErrorClass::Syntax
    }

    pub fn is_semantic(&self) -> bool {
        self.get_class() == ErrorClass::Semantic
    }

    pub fn get_tip(&self) -> ErrorTip {
        match &self.internal_error {
            ErrorImpl::UnexpectedToken { .. } => ErrorTip::Suggestion(String::from(
                "Expected a number, an identifier or `(`",
            )),
            ErrorImpl::ExpectedCloseParen { .. } => {
                ErrorTip::Suggestion(String::from("Did you forget a closing `)`?"))
            }
            ErrorImpl::ExpectedArgumentDelimiter { .. } => ErrorTip::Suggestion(String::from(
                "Arguments are separated by `,` and closed with `)`",
            )),
            ErrorImpl::ExpectedFunctionName { .. } => ErrorTip::None,
            ErrorImpl::ExpectedPrototypeOpenParen { .. } => ErrorTip::None,
            ErrorImpl::ExpectedPrototypeCloseParen { .. } => ErrorTip::Suggestion(String::from(
                "Parameter names are separated by whitespace, not commas",
            )),
            ErrorImpl::UnknownVariable { variable } => ErrorTip::Suggestion(format!(
                "Variable `{}` is not bound in this function",
                variable
            )),
            ErrorImpl::InvalidBinaryOperator { .. } => ErrorTip::Suggestion(String::from(
                "Only `+`, `-`, `*` and `<` can be generated",
            )),
            ErrorImpl::UnknownFunction { function } => ErrorTip::Suggestion(format!(
                "Declare `{}` with `extern` or `def` before calling it",
                function
            )),
            ErrorImpl::IncorrectArgumentCount {
                expected, received, ..
            } => ErrorTip::Suggestion(format!(
                "Expected {} arguments, received {}",
                expected, received
            )),
            ErrorImpl::PrototypeMismatch {
                expected, received, ..
            } => ErrorTip::Suggestion(format!(
                "Declared with {} parameters, defined with {}",
                expected, received
            )),
            ErrorImpl::FunctionRedefinition { function } => {
                ErrorTip::Suggestion(format!("Function `{}` already has a body", function))
            }
            ErrorImpl::InvalidFunction { .. } => ErrorTip::None,
            ErrorImpl::Backend { .. } => ErrorTip::None,
            ErrorImpl::Evaluation { .. } => ErrorTip::None,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.internal_error)
    }
}

impl std::error::Error for Error {}

pub enum ErrorTip {
    None,
    Suggestion(String),
}

impl Display for ErrorTip {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorTip::None => write!(f, ""),
            ErrorTip::Suggestion(suggestion) => write!(f, "{}", suggestion),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ErrorImpl {
    #[error("unknown token when expecting an expression: {token:?}")]
    UnexpectedToken { token: String },
    #[error("expected ')', found {token:?}")]
    ExpectedCloseParen { token: String },
    #[error("expected ')' or ',' in argument list, found {token:?}")]
    ExpectedArgumentDelimiter { token: String },
    #[error("expected function name in prototype, found {token:?}")]
    ExpectedFunctionName { token: String },
    #[error("expected '(' in prototype, found {token:?}")]
    ExpectedPrototypeOpenParen { token: String },
    #[error("expected ')' in prototype, found {token:?}")]
    ExpectedPrototypeCloseParen { token: String },
    #[error("unknown variable {variable:?}")]
    UnknownVariable { variable: String },
    #[error("invalid binary operator {operator:?}")]
    InvalidBinaryOperator { operator: char },
    #[error("unknown function referenced {function:?}")]
    UnknownFunction { function: String },
    #[error("incorrect number of arguments passed to {function:?}: expected {expected}, received {received}")]
    IncorrectArgumentCount {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("definition of {function:?} does not match its declaration: expected {expected} parameters, received {received}")]
    PrototypeMismatch {
        function: String,
        expected: usize,
        received: usize,
    },
    #[error("function {function:?} cannot be redefined")]
    FunctionRedefinition { function: String },
    #[error("function {function:?} failed verification")]
    InvalidFunction { function: String },
    #[error("backend error: {message}")]
    Backend { message: String },
    #[error("evaluation error: {message}")]
    Evaluation { message: String },
}
