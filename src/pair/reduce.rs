//! Canonical form
//!
//! Reduction works on the bijection alone: blocks are merged pairwise
//! (on both sides at once) and the trees are rebuilt from the final block
//! sets. Each pass returns a new bijection; the input is never mutated.
//!
//! 1. `reduce_grid` merges whole grids: along colour `c` it only merges if
//!    *every* block pairs up with its neighbour. Grid merges commute, so the
//!    result does not depend on tree shape.
//! 2. `merge_blocks` then greedily merges any mergeable pair, lowest colour
//!    first, restarting after every merge.

use std::collections::HashMap;

use tracing::{debug, trace};

use super::TreePair;
use crate::address::{LeafAddress, SignificantColorOrder};
use crate::permutation::LeafBijection;
use crate::tree::StructureError;
use crate::{Result, MAXCOL};

impl TreePair {
    /// Canonical representative: smallest grid, then greedy block merging
    pub fn reduce(&self) -> Result<TreePair> {
        self.reduce_with(true)
    }

    /// Canonical representative; `merge_blocks = false` stops at the
    /// smallest grid on the left
    pub fn reduce_with(&self, merge_blocks: bool) -> Result<TreePair> {
        debug!(blocks = self.num_blocks(), merge_blocks, "reducing tree pair");
        let mut work = self.clone();
        if work.is_multi_dimensional() {
            work.extend_to_flat()?;
        }
        let mut map = reduce_grid(&work.bijection)?;
        if merge_blocks {
            map = self::merge_blocks(&map)?;
        }
        Ok(TreePair::from_bijection(map)?)
    }

    /// String of the canonical representative
    pub fn canonical_string(&self) -> Result<String> {
        Ok(self.reduce()?.to_string())
    }

    /// True when both pairs represent the same group element
    pub fn same_element(a: &TreePair, b: &TreePair) -> Result<bool> {
        Ok(a.canonical_string()? == b.canonical_string()?)
    }
}

/// Two blocks merge when they are adjacent along some colour, their images
/// are adjacent along the same colour, and the order of the pair is kept.
pub fn are_mergeable(a: &LeafAddress, b: &LeafAddress, map: &LeafBijection) -> bool {
    let Some(color) = a.is_adjacent_to(b) else {
        return false;
    };
    let (Some(ra), Some(rb)) = (map.get(a), map.get(b)) else {
        return false;
    };
    if ra.is_adjacent_to(rb) != Some(color) {
        return false;
    }
    match SignificantColorOrder::new(color as usize) {
        Ok(order) => order.compare(a, b) == order.compare(ra, rb),
        Err(_) => false,
    }
}

/// Copy of `map` with each `(left, right)` block pair replaced by its parent
/// along `color`, on both sides
fn merged(
    map: &LeafBijection,
    pairs: &[(LeafAddress, LeafAddress)],
    color: usize,
) -> std::result::Result<LeafBijection, StructureError> {
    let mut out: HashMap<LeafAddress, LeafAddress> =
        map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (first, second) in pairs {
        let image = out.remove(first).ok_or_else(|| StructureError::NoSuchAddress {
            address: first.to_string(),
        })?;
        out.remove(second);
        let parent = first.parent_along(color)?;
        let image_parent = image.parent_along(color)?;
        trace!(%parent, %image_parent, color, "merged blocks");
        out.insert(parent, image_parent);
    }
    Ok(LeafBijection::from_map(out))
}

fn sorted_blocks(map: &LeafBijection, color: usize) -> std::result::Result<Vec<LeafAddress>, StructureError> {
    let mut blocks: Vec<LeafAddress> = map.keys().cloned().collect();
    SignificantColorOrder::new(color)?.sort(&mut blocks);
    Ok(blocks)
}

/// Merge complete grids, lowest colour first; wraps back to colour 1 after
/// every merge and stops once no colour merges.
pub(crate) fn reduce_grid(map: &LeafBijection) -> std::result::Result<LeafBijection, StructureError> {
    let mut map = map.clone();
    let mut color = 1;
    while color < MAXCOL && map.len() > 1 {
        let blocks = sorted_blocks(&map, color)?;
        // an odd block count can never pair up completely
        let grid = blocks.len() % 2 == 0
            && blocks.chunks_exact(2).all(|pair| {
                pair[0].is_adjacent_to(&pair[1]) == Some(color as u8)
                    && are_mergeable(&pair[0], &pair[1], &map)
            });
        if grid {
            let pairs: Vec<_> = blocks
                .chunks_exact(2)
                .map(|pair| (pair[0].clone(), pair[1].clone()))
                .collect();
            map = merged(&map, &pairs, color)?;
            color = 1;
        } else {
            color += 1;
        }
    }
    Ok(map)
}

/// Merge single mergeable pairs, lowest colour first, restarting from
/// colour 1 after each merge.
pub(crate) fn merge_blocks(map: &LeafBijection) -> std::result::Result<LeafBijection, StructureError> {
    let mut map = map.clone();
    'restart: while map.len() > 1 {
        for color in 1..MAXCOL {
            let blocks = sorted_blocks(&map, color)?;
            let found = blocks.windows(2).find(|pair| {
                pair[0].is_adjacent_to(&pair[1]) == Some(color as u8)
                    && are_mergeable(&pair[0], &pair[1], &map)
            });
            if let Some(pair) = found {
                let pair = (pair[0].clone(), pair[1].clone());
                map = merged(&map, &[pair], color)?;
                continue 'restart;
            }
        }
        break;
    }
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair(s: &str) -> TreePair {
        s.parse().unwrap()
    }

    #[test]
    fn test_mergeable_requires_order() {
        let kept = pair("100,100,1 2");
        let swapped = pair("100,100,2 1");
        let leaves = kept.left().detailed_leaves();
        assert!(are_mergeable(&leaves[0], &leaves[1], kept.bijection()));
        assert!(!are_mergeable(&leaves[0], &leaves[1], swapped.bijection()));
        let other_color = pair("100,200");
        assert!(!are_mergeable(&leaves[0], &leaves[1], other_color.bijection()));
    }

    #[test]
    fn test_reduce_identity_shapes() {
        for s in ["100,100", "1200200,2100100,1 3 2 4", "12300020300,same"] {
            let reduced = pair(s).reduce().unwrap();
            assert_eq!(reduced.to_string(), "0,0,1", "{}", s);
        }
    }

    #[test]
    fn test_reduce_keeps_swap() {
        let reduced = pair("100,100,2 1").reduce().unwrap();
        assert_eq!(reduced.to_string(), "100,100,2 1");
    }

    #[test]
    fn test_reduce_is_idempotent() {
        for s in ["11000,10100,1 2 3", "12000,20100,2 3 1", "1200200,1200200,2 1 4 3"] {
            let once = pair(s).reduce().unwrap();
            let twice = once.reduce().unwrap();
            assert_eq!(once.to_string(), twice.to_string());
        }
    }

    #[test]
    fn test_grid_reduction_stops_at_grid() {
        // quadrant swap along colour 2: the colour-1 halves still merge
        let p = pair("1200200,1200200,2 1 4 3");
        let grid = p.reduce_with(false).unwrap();
        assert_eq!(grid.num_blocks(), 2);
        assert_eq!(grid.to_string(), "200,200,2 1");
    }

    #[test]
    fn test_odd_block_count_is_not_a_grid() {
        let p = pair("11000,11000");
        let map = reduce_grid(p.bijection()).unwrap();
        assert_eq!(map.len(), 3);
        let merged = merge_blocks(&map).unwrap();
        assert_eq!(merged.len(), 1);
    }

    #[test]
    fn test_same_element() {
        let a = pair("100,100");
        let b = pair("1200200,1200200");
        assert!(TreePair::same_element(&a, &b).unwrap());
        let c = pair("100,100,2 1");
        assert!(!TreePair::same_element(&a, &c).unwrap());
    }
}
