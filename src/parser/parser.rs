//! Token cursor used by every parse function.
//!
//! The cursor owns the token list and exposes the current token, replacing
//! a shared "current token" cell. Payloads (identifier text, numeric value)
//! live on the token itself and must be read before advancing.

use std::rc::Rc;

use crate::{
    errors::errors::{Error, ErrorImpl},
    lexer::{
        lexer::tokenize,
        tokens::{Token, TokenKind},
    },
    Position, Span, MK_SPAN, MK_TOKEN,
};

use super::lookups::PrecedenceTable;

/// The main parser structure that maintains parsing state.
///
/// Holds the token stream, the position of the current token and the
/// operator precedence table used for binary expressions.
pub struct Parser {
    /// The list of tokens to parse, always terminated by `EOF`
    tokens: Vec<Token>,
    /// Index of the current token
    pos: usize,
    /// Binding strengths of binary operators
    precedence: PrecedenceTable,
}

impl Parser {
    /// Creates a new Parser over `tokens` using the default precedence table.
    ///
    /// An `EOF` token is appended if the list does not already end in one.
    pub fn new(tokens: Vec<Token>, file: Rc<String>) -> Self {
        Parser::with_precedence(tokens, file, PrecedenceTable::default())
    }

    pub fn with_precedence(
        mut tokens: Vec<Token>,
        file: Rc<String>,
        precedence: PrecedenceTable,
    ) -> Self {
        if tokens.last().map(|token| token.kind) != Some(TokenKind::EOF) {
            let end = tokens.last().map(|token| token.span.end.0).unwrap_or(0);
            let span = MK_SPAN!(end, end, file);
            tokens.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));
        }

        Parser {
            tokens,
            pos: 0,
            precedence,
        }
    }

    /// Tokenizes `source` and creates a parser over the result.
    pub fn from_source(source: &str, file: Option<String>) -> Self {
        let tokens = tokenize(source, file);
        let file = tokens
            .last()
            .map(|token| Rc::clone(&token.span.start.1))
            .unwrap_or_else(|| Rc::new(String::from("shell")));

        Parser::new(tokens, file)
    }

    /// Returns the current token without advancing.
    pub fn current_token(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    /// Returns the kind of the current token.
    pub fn current_token_kind(&self) -> TokenKind {
        self.current_token().kind
    }

    /// Advances to the next token and returns the previous one.
    ///
    /// The cursor never moves past the final `EOF` token.
    pub fn advance(&mut self) -> &Token {
        let current = self.pos.min(self.tokens.len() - 1);
        if current + 1 < self.tokens.len() {
            self.pos = current + 1;
        }
        &self.tokens[current]
    }

    /// Consumes a token of `expected_kind`, or fails with `error` built
    /// from the text of the token actually found.
    pub fn expect_error(
        &mut self,
        expected_kind: TokenKind,
        error: fn(String) -> ErrorImpl,
    ) -> Result<Token, Error> {
        if self.current_token_kind() != expected_kind {
            Err(self.error_here(error))
        } else {
            Ok(self.advance().clone())
        }
    }

    /// Builds an error located at the current token.
    pub fn error_here(&self, error: fn(String) -> ErrorImpl) -> Error {
        let token = self.current_token();
        Error::new(error(token.value.clone()), token.span.start.clone())
    }

    /// The precedence of the current token, or -1 if it is not a binary
    /// operator.
    pub fn current_precedence(&self) -> i32 {
        self.precedence.token_precedence(self.current_token_kind())
    }

    pub fn get_precedence(&self) -> &PrecedenceTable {
        &self.precedence
    }

    /// Mutable access to the precedence table. Only change it between
    /// top-level constructs, never mid-parse.
    pub fn get_precedence_mut(&mut self) -> &mut PrecedenceTable {
        &mut self.precedence
    }

    /// Returns the position of the current token in the source.
    pub fn get_position(&self) -> Position {
        self.current_token().span.start.clone()
    }

    pub fn at_eof(&self) -> bool {
        self.current_token_kind() == TokenKind::EOF
    }
}
