use crate::error::Span;
use std::fmt;

/// Parsed source text: statements in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expression {
        expr: Expr,
        span: Span,
    },
    Block {
        statements: Vec<Stmt>,
        span: Span,
    },
}

impl Stmt {
    pub fn span(&self) -> &Span {
        match self {
            Stmt::Expression { span, .. } => span,
            Stmt::Block { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Number {
        value: f64,
        span: Span,
    },
    Boolean {
        value: bool,
        span: Span,
    },
    /// A band reference, resolved through the raster source at evaluation.
    Identifier {
        name: String,
        span: Span,
    },
    Prefix {
        operator: PrefixOp,
        operand: Box<Expr>,
        span: Span,
    },
    Infix {
        left: Box<Expr>,
        operator: InfixOp,
        right: Box<Expr>,
        span: Span,
    },
}

impl Expr {
    pub fn span(&self) -> &Span {
        match self {
            Expr::Number { span, .. } => span,
            Expr::Boolean { span, .. } => span,
            Expr::Identifier { span, .. } => span,
            Expr::Prefix { span, .. } => span,
            Expr::Infix { span, .. } => span,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrefixOp {
    Negate,
    Not,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfixOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Less,
    Greater,
    Equal,
    NotEqual,
    Mask,
}

impl InfixOp {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            InfixOp::Add | InfixOp::Subtract | InfixOp::Multiply | InfixOp::Divide
        )
    }

    /// Applies an arithmetic operator to two samples. `None` for
    /// non-arithmetic operators.
    pub fn apply(&self, left: f64, right: f64) -> Option<f64> {
        match self {
            InfixOp::Add => Some(left + right),
            InfixOp::Subtract => Some(left - right),
            InfixOp::Multiply => Some(left * right),
            InfixOp::Divide => Some(left / right),
            _ => None,
        }
    }
}

impl fmt::Display for PrefixOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PrefixOp::Negate => write!(f, "-"),
            PrefixOp::Not => write!(f, "!"),
        }
    }
}

impl fmt::Display for InfixOp {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            InfixOp::Add => "+",
            InfixOp::Subtract => "-",
            InfixOp::Multiply => "*",
            InfixOp::Divide => "/",
            InfixOp::Less => "<",
            InfixOp::Greater => ">",
            InfixOp::Equal => "==",
            InfixOp::NotEqual => "!=",
            InfixOp::Mask => "#",
        };
        write!(f, "{}", symbol)
    }
}

// Fully parenthesized rendering, so precedence is visible.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Number { value, .. } => write!(f, "{}", value),
            Expr::Boolean { value, .. } => write!(f, "{}", value),
            Expr::Identifier { name, .. } => write!(f, "{}", name),
            Expr::Prefix {
                operator, operand, ..
            } => write!(f, "({}{})", operator, operand),
            Expr::Infix {
                left,
                operator,
                right,
                ..
            } => write!(f, "({} {} {})", left, operator, right),
        }
    }
}

impl fmt::Display for Stmt {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Stmt::Expression { expr, .. } => write!(f, "{};", expr),
            Stmt::Block { statements, .. } => {
                write!(f, "{{")?;
                for statement in statements {
                    write!(f, " {}", statement)?;
                }
                write!(f, " }}")
            }
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, statement) in self.statements.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", statement)?;
        }
        Ok(())
    }
}
