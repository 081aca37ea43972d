//! Tree reconstruction from a list of blocks
//!
//! Adjacent blocks are merged bottom-up into carets until a single block
//! (the whole cube) remains. Merging is greedy: the lowest colour that
//! yields a merge is always tried first, which makes the resulting tree
//! canonical for the pattern. Sibling blocks are only found when they are
//! neighbours in a colour order; when no order shows any, the remaining
//! blocks are split top-down instead.

use std::collections::HashMap;

use super::{ColoredTree, StructureError};
use crate::address::{LeafAddress, SignificantColorOrder};
use crate::MAXCOL;

use tracing::debug;

impl ColoredTree {
    /// Build a tree whose leaves are exactly `pattern`.
    ///
    /// Each pass scans the blocks sorted by the current colour and merges
    /// every neighbouring pair adjacent along it. A pass that merged
    /// something restarts at colour 1; otherwise the next colour is tried.
    /// A full cycle of colours without a merge means the blocks do not tile
    /// the cube.
    pub fn from_pattern<I>(pattern: I) -> Result<Self, StructureError>
    where
        I: IntoIterator<Item = LeafAddress>,
    {
        let mut blocks: Vec<LeafAddress> = pattern.into_iter().collect();
        if blocks.is_empty() {
            return Err(StructureError::EmptyPattern);
        }

        let mut fragments: HashMap<LeafAddress, String> = HashMap::with_capacity(blocks.len());
        for block in &blocks {
            if fragments.insert(block.clone(), "0".to_string()).is_some() {
                return Err(StructureError::DuplicateBlock {
                    address: block.to_string(),
                });
            }
        }

        let mut color = 1;
        let mut order = SignificantColorOrder::new(color)?;
        order.sort(&mut blocks);
        let mut i = 0;
        let mut merged_in_pass = false;
        let mut idle_passes = 0;

        while blocks.len() > 1 {
            if blocks[i].is_adjacent_to(&blocks[i + 1]) == Some(color as u8) {
                let right = blocks.remove(i + 1);
                let left = blocks.remove(i);
                let parent = left.parent_along(color)?;
                let lhs = fragments.remove(&left).unwrap_or_default();
                let rhs = fragments.remove(&right).unwrap_or_default();
                fragments.insert(parent.clone(), format!("{color}{lhs}{rhs}"));
                blocks.push(parent);
                order.sort(&mut blocks);
                merged_in_pass = true;
            }

            if i + 2 < blocks.len() {
                i += 1;
                continue;
            }

            // end of pass
            if merged_in_pass {
                color = 1;
                idle_passes = 0;
            } else {
                idle_passes += 1;
                if idle_passes >= MAXCOL - 1 {
                    // no neighbouring siblings left in any order
                    let remaining = blocks.len();
                    debug!(blocks = remaining, "greedy merge stalled, splitting top-down");
                    let structure = split_top_down(blocks, &mut fragments)
                        .ok_or(StructureError::NotADecomposition { blocks: remaining })?;
                    return Self::parse_structure(&structure);
                }
                color = color % (MAXCOL - 1) + 1;
            }
            order = SignificantColorOrder::new(color)?;
            order.sort(&mut blocks);
            merged_in_pass = false;
            i = 0;
        }

        match blocks.pop() {
            Some(last) if last.is_empty() => {
                let structure = fragments.remove(&last).unwrap_or_else(|| "0".to_string());
                Self::parse_structure(&structure)
            }
            _ => Err(StructureError::NotADecomposition { blocks: 1 }),
        }
    }
}

/// Rebuild the structure string of `blocks` by cutting the whole cube
/// recursively, using the fragments already merged for each block.
///
/// A box is cut along the lowest colour in which every block inside it is
/// cut. `None` when the blocks do not tile the cube.
fn split_top_down(
    blocks: Vec<LeafAddress>,
    fragments: &mut HashMap<LeafAddress, String>,
) -> Option<String> {
    let mut out = String::new();
    let mut stack = vec![(blocks, [0usize; MAXCOL])];
    while let Some((group, depth)) = stack.pop() {
        if let [block] = group.as_slice() {
            if (1..MAXCOL).any(|c| block.path_len(c) != depth[c]) {
                return None;
            }
            out.push_str(&fragments.remove(block)?);
            continue;
        }
        let color = (1..MAXCOL).find(|&c| group.iter().all(|b| b.path_len(c) > depth[c]))?;
        let (right, left): (Vec<_>, Vec<_>) = group
            .into_iter()
            .partition(|b| b.color_path(color)[depth[color]]);
        if left.is_empty() || right.is_empty() {
            return None;
        }
        let mut below = depth;
        below[color] += 1;
        out.push_str(&color.to_string());
        stack.push((right, below));
        stack.push((left, below));
    }
    Some(out)
}
