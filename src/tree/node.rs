//! Arena node of a coloured tree
//!
//! Nodes live in the owning [`ColoredTree`](super::ColoredTree) and refer to
//! each other by [`NodeId`]; the parent link is an index, so there is no
//! ownership cycle.
//!
//! Invariant: `is_leaf() ⇔ color() == 0 ⇔ children().is_none()`.

use std::fmt;

use crate::address::{Direction, LeafAddress};
use crate::Color;

/// Index of a node inside its tree's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    /// Raw arena index
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Tree node: a leaf (colour 0) or a cut with exactly two children
#[derive(Debug, Clone)]
pub struct TreeNode {
    pub(crate) color: Color,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Option<(NodeId, NodeId)>,
    /// Which child of the parent this node is
    pub(crate) side: Option<Direction>,
    /// Cached block address
    pub(crate) address: LeafAddress,
}

impl TreeNode {
    /// Detached root leaf
    pub(crate) fn root() -> Self {
        Self {
            color: 0,
            parent: None,
            children: None,
            side: None,
            address: LeafAddress::new(),
        }
    }

    /// Leaf hanging below `parent`
    pub(crate) fn child(parent: NodeId, side: Direction, address: LeafAddress) -> Self {
        Self {
            color: 0,
            parent: Some(parent),
            children: None,
            side: Some(side),
            address,
        }
    }

    /// Cut colour, 0 for leaves
    #[inline]
    pub fn color(&self) -> Color {
        self.color
    }

    /// Check if leaf
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// `(left, right)` children of a cut
    #[inline]
    pub fn children(&self) -> Option<(NodeId, NodeId)> {
        self.children
    }

    /// Left child
    pub fn left(&self) -> Option<NodeId> {
        self.children.map(|(l, _)| l)
    }

    /// Right child
    pub fn right(&self) -> Option<NodeId> {
        self.children.map(|(_, r)| r)
    }

    /// Parent, `None` at the root
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Which child of its parent this node is, `None` at the root
    pub fn side(&self) -> Option<Direction> {
        self.side
    }

    /// Address of the block this node covers
    #[inline]
    pub fn address(&self) -> &LeafAddress {
        &self.address
    }
}
