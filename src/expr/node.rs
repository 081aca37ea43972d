use std::fmt;

use super::operators::{BinaryOp, UnaryOp};

/// Parsed expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExprNode {
    /// Variable name or constant literal, trimmed
    Atom {
        /// Text as written
        text: String,
        /// Char offset of the first character in the statement
        position: usize,
    },
    /// Prefix operator applied to one operand
    Unary {
        /// Operation
        op: UnaryOp,
        /// Symbol as written
        symbol: String,
        /// Operand
        operand: Box<ExprNode>,
    },
    /// Infix operator applied to two operands
    Binary {
        /// Operation
        op: BinaryOp,
        /// Symbol as written
        symbol: String,
        /// Left operand
        left: Box<ExprNode>,
        /// Right operand
        right: Box<ExprNode>,
    },
}

impl ExprNode {
    /// Number of operator applications
    pub fn operator_count(&self) -> usize {
        match self {
            ExprNode::Atom { .. } => 0,
            ExprNode::Unary { operand, .. } => 1 + operand.operator_count(),
            ExprNode::Binary { left, right, .. } => {
                1 + left.operator_count() + right.operator_count()
            }
        }
    }
}

impl fmt::Display for ExprNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExprNode::Atom { text, .. } => write!(f, "{}", text),
            ExprNode::Unary {
                symbol, operand, ..
            } => write!(f, "({} {})", symbol.trim(), operand),
            ExprNode::Binary {
                symbol,
                left,
                right,
                ..
            } => write!(f, "({} {} {})", left, symbol.trim(), right),
        }
    }
}
