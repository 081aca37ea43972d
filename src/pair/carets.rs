//! Caret editing on tree pairs
//!
//! Every edit touches the left tree, the matching right-tree leaf and the
//! bijection together, so the pair is valid again as soon as the call
//! returns.

use tracing::trace;

use super::TreePair;
use crate::address::Direction;
use crate::permutation::PermutationError;
use crate::tree::{NodeId, StructureError};
use crate::{check_color, Result, MAXCOL};

impl TreePair {
    /// Insert a caret of colour `color` at the left-tree leaf reached by
    /// `path`, mirroring it on the image leaf.
    pub fn add_caret(&mut self, path: &str, color: usize) -> Result<()> {
        let id = self.left.node_by_path(path)?;
        self.add_caret_at(id, color)
    }

    /// Same as [`add_caret`](Self::add_caret), from text `"<path> <color>"`
    pub fn add_caret_command(&mut self, command: &str) -> Result<()> {
        let malformed = || StructureError::MalformedCommand {
            text: command.to_string(),
        };
        let tokens: Vec<&str> = command.split_whitespace().collect();
        let [path, color] = tokens.as_slice() else {
            return Err(malformed().into());
        };
        let color: usize = color.parse().map_err(|_| malformed())?;
        self.add_caret(path, color)
    }

    pub(crate) fn add_caret_at(&mut self, id: NodeId, color: usize) -> Result<()> {
        check_color(color)?;
        if !self.left.is_leaf(id) {
            return Err(StructureError::NotALeaf {
                path: self.left.path_of(id),
            }
            .into());
        }
        let leaf = self.left.node(id).address().clone();
        let image = self
            .bijection
            .get(&leaf)
            .cloned()
            .ok_or_else(|| PermutationError::Unmatched {
                address: leaf.to_string(),
            })?;
        let right_id = self.right.node_by_address(&image)?;

        self.left.add_caret(id, color)?;
        self.right.add_caret(right_id, color)?;
        self.bijection.remove(&leaf);
        for side in [Direction::Left, Direction::Right] {
            self.bijection
                .insert(leaf.child(color, side)?, image.child(color, side)?);
        }
        trace!(%leaf, %image, color, "added caret");
        Ok(())
    }

    /// Check if the left-tree node at `path` is an exposed caret
    pub fn is_exposed_caret(&self, path: &str) -> std::result::Result<bool, StructureError> {
        let id = self.left.node_by_path(path)?;
        Ok(self.exposed_image(id).is_some())
    }

    /// Right-tree caret that a left caret cancels against: the children map
    /// in order onto the two children of a same-coloured caret.
    fn exposed_image(&self, id: NodeId) -> Option<NodeId> {
        let (ll, lr) = self.left.node(id).children()?;
        if !self.left.is_leaf(ll) || !self.left.is_leaf(lr) {
            return None;
        }
        let rl_addr = self.bijection.get(self.left.node(ll).address())?;
        let rr_addr = self.bijection.get(self.left.node(lr).address())?;
        let rl = self.right.node_by_address(rl_addr).ok()?;
        let rr = self.right.node_by_address(rr_addr).ok()?;
        let parent = self.right.node(rl).parent()?;
        let same_caret = self.right.node(parent).children() == Some((rl, rr));
        let same_color = self.right.color(parent) == self.left.color(id);
        (same_caret && same_color).then_some(parent)
    }

    /// Cancel the exposed caret at `path`; false when it is not exposed
    pub fn remove_caret(&mut self, path: &str) -> Result<bool> {
        let id = self.left.node_by_path(path)?;
        self.remove_caret_at(id)
    }

    fn remove_caret_at(&mut self, id: NodeId) -> Result<bool> {
        let Some(parent) = self.exposed_image(id) else {
            return Ok(false);
        };
        if let Some((ll, lr)) = self.left.node(id).children() {
            self.bijection.remove(self.left.node(ll).address());
            self.bijection.remove(self.left.node(lr).address());
        }
        self.bijection.insert(
            self.left.node(id).address().clone(),
            self.right.node(parent).address().clone(),
        );
        self.left.remove_caret(id)?;
        self.right.remove_caret(parent)?;
        trace!(path = %self.left.path_of(id), "removed exposed caret");
        Ok(true)
    }

    /// Cancel exposed carets bottom-up until none is left on the left tree
    pub fn remove_exposed_carets(&mut self) -> Result<()> {
        for id in self.left.postorder() {
            if !self.left.is_leaf(id) {
                self.remove_caret_at(id)?;
            }
        }
        Ok(())
    }

    /// Insert carets until each colour `c` occurs at least `min_per_color[c]`
    /// times on every root-to-leaf path of the left tree (and at least as
    /// often as it already does somewhere). Slot 0 is ignored.
    pub fn extend(&mut self, min_per_color: &[usize; MAXCOL]) -> Result<()> {
        let mut needs = self.left.color_depths();
        for (need, &min) in needs.iter_mut().zip(min_per_color) {
            *need = (*need).max(min);
        }
        needs[0] = 0;

        let mut stack = vec![(self.left.root(), needs)];
        while let Some((id, mut needs)) = stack.pop() {
            let Some(color) = needs.iter().position(|&n| n > 0) else {
                continue;
            };
            if self.left.is_leaf(id) {
                self.add_caret_at(id, color)?;
            }
            let own = self.left.color(id) as usize;
            needs[own] = needs[own].saturating_sub(1);
            if let Some((l, r)) = self.left.node(id).children() {
                stack.push((r, needs));
                stack.push((l, needs));
            }
        }
        Ok(())
    }

    /// Extend the left tree to a grid: colours `1..=max(used, min_dim)`
    /// each occur `max(max_color_depth, min_depth)` times on every path.
    pub fn extend_uniform(&mut self, min_dim: usize, min_depth: usize) -> Result<()> {
        if min_dim >= MAXCOL {
            return Err(StructureError::OutOfBounds {
                what: "dimension",
                value: min_dim as i64,
                min: 0,
                max: (MAXCOL - 1) as i64,
            }
            .into());
        }
        let depths = self.left.color_depths();
        let used = (1..MAXCOL).rev().find(|&c| depths[c] > 0).unwrap_or(0);
        let dim = used.max(min_dim);
        let depth = self.left.max_color_depth().max(min_depth);
        let mut needs = [0; MAXCOL];
        for need in needs.iter_mut().take(dim + 1).skip(1) {
            *need = depth;
        }
        self.extend(&needs)
    }

    /// Extend the left tree to the grid given by its own colour depths
    pub fn extend_to_flat(&mut self) -> Result<()> {
        let depths = self.left.color_depths();
        self.extend(&depths)
    }
}
