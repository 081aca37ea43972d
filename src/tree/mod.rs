//! Coloured binary trees
//!
//! A tree is a recursive dyadic decomposition of the unit hypercube: each
//! internal node halves its block along the dimension given by its colour,
//! each leaf is one block.
//!
//! Text form is the depth-first prefix listing of node colours, `0` for a
//! leaf: `"120000"` is a colour-1 root whose left child is a colour-2 caret.

mod node;
mod pattern;
mod random;
mod traversal;

pub use node::{NodeId, TreeNode};

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::address::Direction;
use crate::{check_color, Color, MAXCOL};

/// Malformed tree, address or pattern; invalid numeric bounds
#[derive(Debug, Error, Clone, PartialEq)]
pub enum StructureError {
    /// Colour outside `1..MAXCOL`
    #[error("invalid color {color}: must be 1 to {}", MAXCOL - 1)]
    InvalidColor {
        /// Offending colour
        color: usize,
    },

    /// Tried to remove a choice from an empty colour path
    #[error("color path {color} is empty")]
    EmptyColorPath {
        /// Colour whose path was empty
        color: Color,
    },

    /// Non-digit in a tree string
    #[error("'{symbol}' at position {position} is not a tree symbol")]
    InvalidSymbol {
        /// Offending character
        symbol: char,
        /// Character offset in the tree string
        position: usize,
    },

    /// Tree string continues after the tree is complete
    #[error("leftover symbols after complete tree: {leftover}")]
    LeftoverSymbols {
        /// Unconsumed suffix
        leftover: String,
    },

    /// Tree string ends before every node has been described
    #[error("not enough symbols for a tree structure")]
    MissingSymbols,

    /// `random N C` request that is not two integers
    #[error("invalid random request '{request}': expected `random N C`")]
    InvalidRandomRequest {
        /// The request text
        request: String,
    },

    /// A numeric parameter outside its allowed range
    #[error("{what} = {value} is out of bounds [{min}, {max}]")]
    OutOfBounds {
        /// Name of the parameter
        what: &'static str,
        /// Value supplied
        value: i64,
        /// Smallest allowed value
        min: i64,
        /// Largest allowed value
        max: i64,
    },

    /// Caret insertion requested on an internal node
    #[error("node at path '{path}' is not a leaf")]
    NotALeaf {
        /// Root-relative path of the node
        path: String,
    },

    /// Caret removal requested on something other than a caret
    #[error("node at path '{path}' is not a caret")]
    NotACaret {
        /// Root-relative path of the node
        path: String,
    },

    /// Root-relative path leaves the tree
    #[error("no node with path '{path}'")]
    NoSuchPath {
        /// Requested path
        path: String,
    },

    /// Address does not name a node of the tree
    #[error("no node with address {address}")]
    NoSuchAddress {
        /// Requested address
        address: String,
    },

    /// Unparseable address text
    #[error("malformed address '{text}'")]
    MalformedAddress {
        /// Input text
        text: String,
    },

    /// Unparseable tree-pair text
    #[error("malformed tree pair '{text}': expected {{left,right,perm}}, {{left,right}}, {{left,same}} or {{random N C}}")]
    MalformedPair {
        /// Input text
        text: String,
    },

    /// Caret or system command that does not follow its syntax
    #[error("malformed command '{text}'")]
    MalformedCommand {
        /// Input text
        text: String,
    },

    /// Block list that does not tile the cube
    #[error("blocks do not form a dyadic decomposition ({blocks} blocks left unmerged)")]
    NotADecomposition {
        /// Blocks remaining when reconstruction stalled
        blocks: usize,
    },

    /// The same block listed twice
    #[error("block {address} listed twice")]
    DuplicateBlock {
        /// The repeated address
        address: String,
    },

    /// Pattern reconstruction from no blocks
    #[error("empty pattern")]
    EmptyPattern,
}

/// Coloured binary tree stored as a node arena
#[derive(Debug, Clone)]
pub struct ColoredTree {
    nodes: Vec<TreeNode>,
    free: Vec<NodeId>,
    root: NodeId,
}

impl ColoredTree {
    /// Single-leaf tree (the whole cube)
    pub fn leaf() -> Self {
        Self {
            nodes: vec![TreeNode::root()],
            free: Vec::new(),
            root: NodeId(0),
        }
    }

    /// Root node id
    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Node by id
    ///
    /// # Panics
    /// If `id` was not handed out by this tree.
    #[inline]
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    /// Colour of a node
    #[inline]
    pub fn color(&self, id: NodeId) -> Color {
        self.node(id).color
    }

    /// Check if leaf
    #[inline]
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.node(id).is_leaf()
    }

    fn alloc(&mut self, node: TreeNode) -> NodeId {
        match self.free.pop() {
            Some(id) => {
                self.nodes[id.0] = node;
                id
            }
            None => {
                self.nodes.push(node);
                NodeId(self.nodes.len() - 1)
            }
        }
    }

    /// Turn leaf `id` into a caret of colour `color` with two leaf children.
    ///
    /// Does not touch any bijection; tree pairs call this in lock-step on
    /// both trees.
    pub(crate) fn add_caret(&mut self, id: NodeId, color: usize) -> Result<(), StructureError> {
        let color = check_color(color)?;
        if !self.is_leaf(id) {
            return Err(StructureError::NotALeaf {
                path: self.path_of(id),
            });
        }
        let base = self.node(id).address.clone();
        let left = self.alloc(TreeNode::child(
            id,
            Direction::Left,
            base.child(color as usize, Direction::Left)?,
        ));
        let right = self.alloc(TreeNode::child(
            id,
            Direction::Right,
            base.child(color as usize, Direction::Right)?,
        ));
        let node = &mut self.nodes[id.0];
        node.color = color;
        node.children = Some((left, right));
        Ok(())
    }

    /// Collapse caret `id` (both children leaves) back into a leaf.
    pub(crate) fn remove_caret(&mut self, id: NodeId) -> Result<(), StructureError> {
        let (left, right) = match self.node(id).children {
            Some((l, r)) if self.is_leaf(l) && self.is_leaf(r) => (l, r),
            _ => {
                return Err(StructureError::NotACaret {
                    path: self.path_of(id),
                })
            }
        };
        self.free.push(right);
        self.free.push(left);
        let node = &mut self.nodes[id.0];
        node.color = 0;
        node.children = None;
        Ok(())
    }

    /// Root-relative path of a node: `0` = left, `1` = right
    pub fn path_of(&self, id: NodeId) -> String {
        let mut symbols = Vec::new();
        let mut cur = self.node(id);
        while let Some(side) = cur.side {
            symbols.push(side.symbol());
            match cur.parent {
                Some(p) => cur = self.node(p),
                None => break,
            }
        }
        symbols.iter().rev().collect()
    }

    /// Number of leaves (= blocks in the pattern)
    pub fn leaf_count(&self) -> usize {
        self.preorder().into_iter().filter(|&id| self.is_leaf(id)).count()
    }

    /// Depth of the tree; a single leaf has depth 1
    pub fn depth(&self) -> usize {
        let mut depth = vec![0usize; self.nodes.len()];
        for id in self.postorder() {
            depth[id.index()] = match self.node(id).children {
                Some((l, r)) => 1 + depth[l.index()].max(depth[r.index()]),
                None => 1,
            };
        }
        depth[self.root.index()]
    }

    /// For each colour, the largest number of times it occurs on a
    /// root-to-leaf path. Slot 0 is always 1.
    pub fn color_depths(&self) -> [usize; MAXCOL] {
        let mut below = vec![[0usize; MAXCOL]; self.nodes.len()];
        for id in self.postorder() {
            let node = self.node(id);
            let mut depths = [0usize; MAXCOL];
            depths[node.color as usize] = 1;
            if let Some((l, r)) = node.children {
                let (left, right) = (&below[l.index()], &below[r.index()]);
                for c in 0..MAXCOL {
                    depths[c] += left[c].max(right[c]);
                }
            }
            below[id.index()] = depths;
        }
        below[self.root.index()]
    }

    /// Largest colour depth (at least 1)
    pub fn max_color_depth(&self) -> usize {
        self.color_depths().into_iter().max().unwrap_or(1).max(1)
    }

    /// Largest colour used, 0 for a single leaf
    pub fn max_color_value(&self) -> Color {
        self.preorder()
            .into_iter()
            .map(|id| self.color(id))
            .max()
            .unwrap_or(0)
    }

    /// True when both trees describe the same pattern
    pub fn is_equivalent(&self, other: &ColoredTree) -> bool {
        let a: HashSet<_> = self.detailed_leaves().into_iter().collect();
        let b: HashSet<_> = other.detailed_leaves().into_iter().collect();
        a == b
    }

    /// Parse the prefix encoding (no `random` requests)
    pub fn parse_structure(structure: &str) -> Result<Self, StructureError> {
        let mut tree = ColoredTree::leaf();
        let mut pending = vec![tree.root];
        for (position, symbol) in structure.char_indices() {
            let Some(slot) = pending.pop() else {
                return Err(StructureError::LeftoverSymbols {
                    leftover: structure[position..].to_string(),
                });
            };
            let color = symbol
                .to_digit(10)
                .ok_or(StructureError::InvalidSymbol { symbol, position })?;
            if color > 0 {
                tree.add_caret(slot, color as usize)?;
                if let Some((l, r)) = tree.node(slot).children {
                    pending.push(r);
                    pending.push(l);
                }
            }
        }
        if pending.is_empty() {
            Ok(tree)
        } else {
            Err(StructureError::MissingSymbols)
        }
    }
}

impl FromStr for ColoredTree {
    type Err = StructureError;

    /// Prefix encoding, or `random N C`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(params) = s.strip_prefix("random") {
            let (leaves, colors) = random::parse_request(params)?;
            return ColoredTree::random(leaves, colors);
        }
        ColoredTree::parse_structure(s)
    }
}

impl fmt::Display for ColoredTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for id in self.preorder() {
            write!(f, "{}", self.color(id))?;
        }
        Ok(())
    }
}

impl PartialEq for ColoredTree {
    /// Structural equality (same colour sequence in DFS order)
    fn eq(&self, other: &Self) -> bool {
        let a = self.preorder();
        let b = other.preorder();
        a.len() == b.len()
            && a.iter()
                .zip(&b)
                .all(|(&x, &y)| self.color(x) == other.color(y))
    }
}

impl Eq for ColoredTree {}
