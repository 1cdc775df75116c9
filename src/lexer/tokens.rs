use lazy_static::lazy_static;
use std::{collections::HashMap, fmt::Display};

use crate::Span;

lazy_static! {
    pub static ref RESERVED_LOOKUP: HashMap<&'static str, TokenKind> = {
        let mut map = HashMap::new();
        map.insert("def", TokenKind::Def);
        map.insert("extern", TokenKind::Extern);
        map
    };
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum TokenKind {
    EOF,
    Number,
    Identifier,

    // Reserved
    Def,
    Extern,

    /// Any other character, operators and punctuation included.
    Char(char),
}

impl TokenKind {
    pub fn is_char(&self, c: char) -> bool {
        *self == TokenKind::Char(c)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenKind::Char(c) => write!(f, "'{}'", c),
            kind => write!(f, "{:?}", kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub span: Span,
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            TokenKind::Identifier | TokenKind::Number => write!(f, "{} ({})", self.kind, self.value),
            _ => write!(f, "{}", self.kind),
        }
    }
}

impl Token {
    /// The numeric payload of a `Number` token.
    ///
    /// Like `strtod`, the longest prefix that reads as a float wins, so
    /// `1.2.3` is `1.2` and a lone `.` is `0`.
    pub fn number_value(&self) -> f64 {
        parse_number_prefix(&self.value)
    }
}

pub(crate) fn parse_number_prefix(text: &str) -> f64 {
    (1..=text.len())
        .rev()
        .filter(|end| text.is_char_boundary(*end))
        .find_map(|end| text[..end].parse::<f64>().ok())
        .unwrap_or(0.0)
}
