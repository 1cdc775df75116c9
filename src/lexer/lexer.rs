use std::rc::Rc;

use lazy_static::lazy_static;
use log::trace;
use regex::Regex;

use crate::{Position, Span, MK_SPAN, MK_TOKEN};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &str);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

lazy_static! {
    // Tried in order; the first pattern matching at the cursor wins.
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern { regex: Regex::new(r"^[a-zA-Z][a-zA-Z0-9]*").unwrap(), handler: symbol_handler },
        RegexPattern { regex: Regex::new(r"^[0-9.]+").unwrap(), handler: number_handler },
        RegexPattern { regex: Regex::new(r"^\s+").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"^#[^\n\r]*").unwrap(), handler: skip_handler },
        RegexPattern { regex: Regex::new(r"(?s)^.").unwrap(), handler: char_handler },
    ];
}

pub struct Lexer<'s> {
    tokens: Vec<Token>,
    source: &'s str,
    pos: usize,
    file: Rc<String>,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str, file: Option<String>) -> Lexer<'s> {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            pos: 0,
            tokens: vec![],
            source,
            file: file_name,
        }
    }

    pub fn advance_n(&mut self, n: usize) {
        self.pos += n;
    }

    pub fn push(&mut self, token: Token) {
        self.tokens.push(token);
    }

    pub fn remainder(&self) -> &'s str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn push_matched(&mut self, kind: TokenKind, matched: &str) {
        let span = MK_SPAN!(self.pos, self.pos + matched.len(), self.file);
        self.push(MK_TOKEN!(kind, String::from(matched), span));
        self.advance_n(matched.len());
    }
}

fn symbol_handler(lexer: &mut Lexer, matched: &str) {
    let kind = RESERVED_LOOKUP
        .get(matched)
        .copied()
        .unwrap_or(TokenKind::Identifier);

    lexer.push_matched(kind, matched);
}

fn number_handler(lexer: &mut Lexer, matched: &str) {
    lexer.push_matched(TokenKind::Number, matched);
}

fn skip_handler(lexer: &mut Lexer, matched: &str) {
    lexer.advance_n(matched.len());
}

fn char_handler(lexer: &mut Lexer, matched: &str) {
    if let Some(c) = matched.chars().next() {
        lexer.push_matched(TokenKind::Char(c), matched);
    }
}

/// Splits `source` into tokens, always ending with a single `EOF` token.
///
/// Lexing cannot fail: characters that are not part of an identifier,
/// number, comment or whitespace become `TokenKind::Char` tokens and are
/// judged by the parser.
pub fn tokenize(source: &str, file: Option<String>) -> Vec<Token> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let remainder = lex.remainder();

        let Some((pattern, matched)) = PATTERNS
            .iter()
            .find_map(|pattern| pattern.regex.find(remainder).map(|m| (pattern, m.as_str())))
        else {
            break;
        };

        (pattern.handler)(&mut lex, matched);
    }

    let span = MK_SPAN!(lex.pos, lex.pos, lex.file);
    lex.push(MK_TOKEN!(TokenKind::EOF, String::from("EOF"), span));

    trace!("tokenized {} tokens from {}", lex.tokens.len(), lex.file);
    lex.tokens
}
