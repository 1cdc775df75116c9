//! The top-level loop.
//!
//! A `Session` repeatedly parses the next top-level construct, generates
//! code for it and reports what happened. Parse failures are recovered by
//! discarding one token; generation failures need no recovery because the
//! construct was already fully consumed.

use log::debug;

use crate::{
    backend::Backend,
    compiler::{
        compiler::{backend_error, Compiler},
        stmt::{gen_function, gen_prototype},
    },
    config::Config,
    errors::errors::{Error, ErrorTip},
    format_error,
    lexer::tokens::TokenKind,
    parser::{
        parser::Parser,
        stmt::{parse_definition, parse_extern, parse_top_level_expr},
    },
};

/// What one call to `Session::step` did.
#[derive(Debug, Clone)]
pub enum Outcome {
    Definition {
        name: String,
        ir: String,
    },
    Extern {
        name: String,
        ir: String,
    },
    Expression {
        ir: String,
        /// `None` when evaluation is disabled or unsupported by the backend
        value: Option<f64>,
        output: String,
    },
    Skipped,
    Failed(Error),
}

pub struct Session<B: Backend> {
    parser: Parser,
    compiler: Compiler<B>,
    config: Config,
    /// Source text used to render diagnostics; may be empty
    source: String,
}

impl<B: Backend> Session<B> {
    /// Creates a session over an existing parser. Operators from `config`
    /// are added to the parser's precedence table.
    pub fn new(mut parser: Parser, backend: B, config: Config) -> Self {
        config.extend_precedence(parser.get_precedence_mut());

        Session {
            parser,
            compiler: Compiler::new(backend),
            config,
            source: String::new(),
        }
    }

    pub fn from_source(source: &str, file: Option<String>, backend: B, config: Config) -> Self {
        let mut session = Session::new(Parser::from_source(source, file), backend, config);
        session.source = String::from(source);
        session
    }

    pub fn get_parser(&self) -> &Parser {
        &self.parser
    }

    pub fn get_compiler(&self) -> &Compiler<B> {
        &self.compiler
    }

    pub fn get_config(&self) -> &Config {
        &self.config
    }

    pub fn into_backend(self) -> B {
        self.compiler.into_backend()
    }

    /// Handles the next top-level construct, or returns `None` at the end
    /// of input.
    pub fn step(&mut self) -> Option<Outcome> {
        let outcome = match self.parser.current_token_kind() {
            TokenKind::EOF => return None,
            TokenKind::Char(';') => {
                self.parser.advance();
                Outcome::Skipped
            }
            TokenKind::Def => self.handle_definition(),
            TokenKind::Extern => self.handle_extern(),
            _ => self.handle_top_level_expression(),
        };

        Some(outcome)
    }

    /// Discards the token the parser stopped on.
    fn recover(&mut self, error: Error) -> Outcome {
        let skipped = self.parser.advance();
        debug!("skipped {} after parse error: {}", skipped, error);
        Outcome::Failed(error)
    }

    pub fn handle_definition(&mut self) -> Outcome {
        let function = match parse_definition(&mut self.parser) {
            Ok(function) => function,
            Err(error) => return self.recover(error),
        };

        match gen_function(&mut self.compiler, &function) {
            Ok(handle) => Outcome::Definition {
                name: function.proto.name,
                ir: self.compiler.backend.print_function(handle),
            },
            Err(error) => Outcome::Failed(error),
        }
    }

    pub fn handle_extern(&mut self) -> Outcome {
        let proto = match parse_extern(&mut self.parser) {
            Ok(proto) => proto,
            Err(error) => return self.recover(error),
        };

        match gen_prototype(&mut self.compiler, &proto) {
            Ok(handle) => Outcome::Extern {
                name: proto.name,
                ir: self.compiler.backend.print_function(handle),
            },
            Err(error) => Outcome::Failed(error),
        }
    }

    /// Generates a bare expression as an anonymous function, runs it when
    /// evaluation is enabled, then removes it.
    pub fn handle_top_level_expression(&mut self) -> Outcome {
        let function = match parse_top_level_expr(&mut self.parser) {
            Ok(function) => function,
            Err(error) => return self.recover(error),
        };

        let handle = match gen_function(&mut self.compiler, &function) {
            Ok(handle) => handle,
            Err(error) => return Outcome::Failed(error),
        };

        let ir = self.compiler.backend.print_function(handle);

        let evaluation = if self.config.evaluate {
            self.compiler.backend.evaluate(handle)
        } else {
            Ok(None)
        };
        self.compiler.backend.abandon_function(handle);

        match evaluation {
            Ok(Some(evaluation)) => Outcome::Expression {
                ir,
                value: Some(evaluation.value),
                output: evaluation.output,
            },
            Ok(None) => Outcome::Expression {
                ir,
                value: None,
                output: String::new(),
            },
            Err(error) => Outcome::Failed(backend_error(error, &function.proto.span.start)),
        }
    }

    /// Renders an outcome the way the interactive loop reports it.
    /// `Skipped` produces no report.
    pub fn format_outcome(&self, outcome: &Outcome) -> Option<String> {
        let report = match outcome {
            Outcome::Definition { ir, .. } => self.with_ir("Read function definition:", ir),
            Outcome::Extern { ir, .. } => self.with_ir("Read extern:", ir),
            Outcome::Expression { ir, value, output } => {
                let mut lines = vec![self.with_ir("Read top-level expression:", ir)];
                if !output.is_empty() {
                    lines.push(String::from(output.trim_end_matches('\n')));
                }
                if let Some(value) = value {
                    lines.push(format!("Evaluated to {:.6}", value));
                }
                lines.join("\n")
            }
            Outcome::Skipped => return None,
            Outcome::Failed(error) => self.format_failure(error),
        };

        Some(report)
    }

    fn with_ir(&self, header: &str, ir: &str) -> String {
        if self.config.print_ir && !ir.is_empty() {
            format!("{}\n{}", header, ir)
        } else {
            String::from(header)
        }
    }

    fn format_failure(&self, error: &Error) -> String {
        if !self.source.is_empty() {
            return format_error(error, &self.source);
        }

        match error.get_tip() {
            ErrorTip::None => format!("Error: {}", error),
            tip => format!("Error: {} ({})", error, tip),
        }
    }

    /// Drives `step` until the input is exhausted, passing every reportable
    /// outcome and its rendering to `report`. Returns the number of failed
    /// constructs.
    pub fn run(&mut self, mut report: impl FnMut(&Outcome, &str)) -> usize {
        let mut failures = 0;

        while let Some(outcome) = self.step() {
            if matches!(outcome, Outcome::Failed(_)) {
                failures += 1;
            }

            if let Some(text) = self.format_outcome(&outcome) {
                report(&outcome, &text);
            }
        }

        failures
    }
}
