//! # Tree-pair arithmetic for the Thompson groups nV
//!
//! An element of nV is a piecewise-linear bijection of the unit hypercube
//! that cuts the cube into dyadic blocks (a *pattern*) and maps them linearly
//! onto the blocks of another pattern. Patterns are encoded as binary trees
//! whose internal nodes are coloured by the dimension they cut.
//!
//! ## Core pieces
//!
//! 1. **Addresses**: a leaf is identified by its per-colour cut history,
//!    independent of the shape of the tree that produced it
//! 2. **Trees**: arena-backed coloured binary trees with prefix encoding
//! 3. **Bijections**: leaf-address maps between two trees
//! 4. **Tree pairs**: compose / invert / reduce / refine / growth
//! 5. **Expressions**: a priority-driven scanner over named tree pairs
//!
//! ## Usage Example
//!
//! ```
//! use nvtrees::{TreePair, VariableEnvironment, ExpressionEngine};
//!
//! let mut env = VariableEnvironment::new();
//! let mut engine = ExpressionEngine::default();
//! engine.evaluate("A = {11000,10100,1 2 3}", &mut env)?;
//! let square = engine.evaluate("A^2", &mut env)?;
//! assert_eq!(square.num_blocks(), env.last_result().unwrap().num_blocks());
//! # Ok::<(), nvtrees::NvError>(())
//! ```

#![warn(missing_docs, missing_debug_implementations)]
#![allow(clippy::new_without_default)]

pub mod address;    // Shape-independent leaf coordinates
pub mod tree;       // Coloured binary trees
pub mod permutation; // Leaf bijections
pub mod pair;       // Tree pairs and their algebra
pub mod env;        // Variable store
pub mod expr;       // Expression language
pub mod session;    // Statement/command boundary for front ends

pub use address::{Direction, LeafAddress, SignificantColorOrder};
pub use env::{Value, VariableEnvironment};
pub use expr::{
    BinaryOp, ExprNode, ExpressionEngine, OperatorError, OperatorTable, ParseError,
    ParseErrorKind, UnaryOp,
};
pub use env::NameError;
pub use pair::{are_mergeable, growth, TreePair};
pub use permutation::{LeafBijection, PermutationError};
pub use session::{Outcome, Session, SessionConfig, Snapshot};
pub use tree::{ColoredTree, NodeId, StructureError, TreeNode};

use thiserror::Error;

/// Number of colour slots. Colours are `1..MAXCOL`; `0` marks a leaf.
///
/// One decimal digit per colour in the tree encoding, so this must stay at 10.
pub const MAXCOL: usize = 10;

/// Colour of a tree node: the dimension cut at that node.
pub type Color = u8;

/// Errors raised anywhere in the engine
///
/// Every failure is recoverable at the statement boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NvError {
    /// Malformed tree or pattern, or an invalid bound
    #[error("structure error: {0}")]
    Structure(#[from] StructureError),

    /// Leaf bijection could not be built or combined
    #[error("permutation error: {0}")]
    Permutation(#[from] PermutationError),

    /// Malformed expression text
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Operator applied to operands of the wrong kind
    #[error("operator error: {0}")]
    Operator(#[from] OperatorError),

    /// Undefined or invalid variable name
    #[error("name error: {0}")]
    Name(#[from] NameError),
}

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, NvError>;

/// Check that `color` is a cut colour (`1..MAXCOL`).
pub(crate) fn check_color(color: usize) -> std::result::Result<Color, StructureError> {
    if (1..MAXCOL).contains(&color) {
        Ok(color as Color)
    } else {
        Err(StructureError::InvalidColor { color })
    }
}
