use std::fmt::{Display, Formatter};

use crate::{Position, Span};

/// Expression Kinds
///
/// The closed set of expression variants. Every node exclusively owns its
/// children, so a parsed expression is always a strict tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Number(f64),
    Variable(String),
    Binary {
        op: char,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Call {
        callee: String,
        args: Vec<Expr>,
    },
}

/// An expression together with the span it was parsed from.
///
/// Equality only looks at the structure; spans are ignored so trees built
/// by hand compare equal to parsed ones.
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

fn null_span() -> Span {
    Span {
        start: Position::null(),
        end: Position::null(),
    }
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Expr { kind, span }
    }

    pub fn number(value: f64) -> Self {
        Expr::new(ExprKind::Number(value), null_span())
    }

    pub fn variable(name: &str) -> Self {
        Expr::new(ExprKind::Variable(String::from(name)), null_span())
    }

    pub fn binary(op: char, left: Expr, right: Expr) -> Self {
        let span = Span {
            start: left.span.start.clone(),
            end: right.span.end.clone(),
        };

        Expr::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            span,
        )
    }

    pub fn call(callee: &str, args: Vec<Expr>) -> Self {
        Expr::new(
            ExprKind::Call {
                callee: String::from(callee),
                args,
            },
            null_span(),
        )
    }

    pub fn get_span(&self) -> &Span {
        &self.span
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            ExprKind::Number(value) => write!(f, "{}", value),
            ExprKind::Variable(name) => write!(f, "{}", name),
            ExprKind::Binary { op, left, right } => write!(f, "({} {} {})", left, op, right),
            ExprKind::Call { callee, args } => {
                write!(f, "{}(", callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}

/// A function signature: its name and ordered parameter names.
///
/// Parameter names are kept exactly as written, duplicates included.
#[derive(Debug, Clone)]
pub struct Prototype {
    pub name: String,
    pub params: Vec<String>,
    pub span: Span,
}

impl PartialEq for Prototype {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.params == other.params
    }
}

impl Prototype {
    pub fn new(name: &str, params: Vec<String>, span: Span) -> Self {
        Prototype {
            name: String::from(name),
            params,
            span,
        }
    }

    /// The nameless prototype wrapping a top-level expression.
    pub fn anonymous(span: Span) -> Self {
        Prototype::new("", vec![], span)
    }

    pub fn is_anonymous(&self) -> bool {
        self.name.is_empty()
    }

    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

impl Display for Prototype {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.params.join(" "))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub proto: Prototype,
    pub body: Expr,
}

impl Function {
    /// Wraps a bare expression so it can be generated and evaluated once.
    pub fn anonymous(body: Expr) -> Self {
        Function {
            proto: Prototype::anonymous(body.span.clone()),
            body,
        }
    }
}

impl Display for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.proto.is_anonymous() {
            write!(f, "{}", self.body)
        } else {
            write!(f, "def {} {}", self.proto, self.body)
        }
    }
}
