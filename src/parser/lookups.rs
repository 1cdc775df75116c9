use std::collections::HashMap;

use lazy_static::lazy_static;

use crate::lexer::tokens::TokenKind;

lazy_static! {
    // 1 is the lowest precedence.
    static ref DEFAULT_PRECEDENCE: HashMap<char, i32> = {
        let mut map = HashMap::new();
        map.insert('<', 10);
        map.insert('+', 20);
        map.insert('-', 20);
        map.insert('*', 40);
        map
    };
}

/// Maps binary operator characters to their binding strength.
///
/// Characters that are missing or mapped to a value `<= 0` are not binary
/// operators. The table only governs parsing: an operator accepted here may
/// still be rejected during code generation.
#[derive(Debug, Clone, PartialEq)]
pub struct PrecedenceTable {
    table: HashMap<char, i32>,
}

impl Default for PrecedenceTable {
    fn default() -> Self {
        PrecedenceTable {
            table: DEFAULT_PRECEDENCE.clone(),
        }
    }
}

impl PrecedenceTable {
    pub fn set(&mut self, op: char, precedence: i32) {
        self.table.insert(op, precedence);
    }

    pub fn get(&self, op: char) -> Option<i32> {
        self.table.get(&op).copied()
    }

    /// The precedence of a pending token, or -1 when it is not a binary
    /// operator.
    pub fn token_precedence(&self, kind: TokenKind) -> i32 {
        match kind {
            TokenKind::Char(c) if c.is_ascii() => match self.table.get(&c) {
                Some(precedence) if *precedence > 0 => *precedence,
                _ => -1,
            },
            _ => -1,
        }
    }
}
