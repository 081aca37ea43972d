//! Expression language over named tree pairs
//!
//! ```text
//! A = {11000,10100,1 2 3}
//! B = (A*!A)^2 # A
//! $B
//! ```
//!
//! Operators, their priorities and the literal formats live in an
//! [`OperatorTable`]; the parser in [`parser`] turns text into an
//! [`ExprNode`] and [`ExpressionEngine`] evaluates it against a
//! [`VariableEnvironment`](crate::VariableEnvironment).

mod eval;
mod node;
mod operators;
pub mod parser;

pub use eval::{ExpressionEngine, OperatorError};
pub use node::ExprNode;
pub use operators::{BinaryOp, ConstantFormat, ConstantKind, Operator, OperatorTable, UnaryOp};
pub use parser::{ParseError, ParseErrorKind};
