//! Depth-first traversal and lookups
//!
//! All walks use an explicit stack; nothing here recurses, so deep trees
//! built by repeated composition cannot overflow the call stack.

use super::{ColoredTree, NodeId, StructureError};
use crate::address::{Direction, LeafAddress};

impl ColoredTree {
    /// Node ids in depth-first prefix order (root, left subtree, right subtree)
    pub fn preorder(&self) -> Vec<NodeId> {
        self.preorder_from(self.root)
    }

    pub(crate) fn preorder_from(&self, start: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![start];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some((l, r)) = self.node(id).children {
                stack.push(r);
                stack.push(l);
            }
        }
        out
    }

    /// Node ids in post-order (children before parents)
    pub fn postorder(&self) -> Vec<NodeId> {
        // reversed (root, right, left) prefix order
        let mut out = Vec::new();
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some((l, r)) = self.node(id).children {
                stack.push(l);
                stack.push(r);
            }
        }
        out.reverse();
        out
    }

    /// Leaf ids, left to right
    pub fn leaves(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| self.is_leaf(id))
            .collect()
    }

    /// Leaf addresses, left to right
    pub fn detailed_leaves(&self) -> Vec<LeafAddress> {
        self.leaves()
            .into_iter()
            .map(|id| self.node(id).address.clone())
            .collect()
    }

    /// Root-relative paths of the leaves, left to right
    pub fn leaf_paths(&self) -> Vec<String> {
        self.leaves().into_iter().map(|id| self.path_of(id)).collect()
    }

    /// Node reached by following a `0`/`1` path from the root
    pub fn node_by_path(&self, path: &str) -> Result<NodeId, StructureError> {
        let missing = || StructureError::NoSuchPath {
            path: path.to_string(),
        };
        let mut cur = self.root;
        for symbol in path.chars() {
            let (l, r) = self.node(cur).children.ok_or_else(missing)?;
            cur = match symbol {
                '0' => l,
                '1' => r,
                _ => return Err(missing()),
            };
        }
        Ok(cur)
    }

    /// Node whose block is exactly `address`
    pub fn node_by_address(&self, address: &LeafAddress) -> Result<NodeId, StructureError> {
        let mut cur = self.root;
        loop {
            let node = self.node(cur);
            if &node.address == address {
                return Ok(cur);
            }
            let next = node.children.and_then(|(l, r)| {
                [l, r]
                    .into_iter()
                    .find(|&child| self.node(child).address.intersects(address))
            });
            match next {
                // only descend into strictly coarser blocks
                Some(child) if self.node(child).address.size_log() <= address.size_log() => {
                    cur = child
                }
                _ => {
                    return Err(StructureError::NoSuchAddress {
                        address: address.to_string(),
                    })
                }
            }
        }
    }

    /// Sibling of a non-root node
    pub fn sibling(&self, id: NodeId) -> Option<NodeId> {
        let node = self.node(id);
        let (l, r) = self.node(node.parent?).children?;
        match node.side? {
            Direction::Left => Some(r),
            Direction::Right => Some(l),
        }
    }
}
