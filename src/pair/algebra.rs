//! Group operations
//!
//! Composition acts on the right: `a.compose(&b)` is the map
//! `x ↦ b(a(x))`, i.e. `a` is applied first. Results are cancelled of
//! exposed carets but not reduced; call [`TreePair::reduce`] for the
//! canonical form.

use std::collections::HashMap;

use tracing::debug;

use super::TreePair;
use crate::permutation::{LeafBijection, PermutationError};
use crate::tree::{ColoredTree, StructureError};
use crate::Result;

impl TreePair {
    /// Inverse element (trees swapped, bijection reversed)
    pub fn inverse(&self) -> TreePair {
        let mut out = self.clone();
        out.invert();
        out
    }

    /// Same map, with the left pattern refined to the common refinement of
    /// the current left pattern and `pattern`.
    ///
    /// Every left block is cut by every block of `pattern` it meets; the
    /// image block is cut by the same suffixes, so the map stays linear on
    /// each piece.
    pub fn refine_to(&self, pattern: &ColoredTree) -> Result<TreePair> {
        debug!(blocks = self.num_blocks(), against = pattern.leaf_count(), "refining tree pair");
        let references = pattern.detailed_leaves();
        let mut map = HashMap::new();
        for leaf in self.left.detailed_leaves() {
            let image = self
                .bijection
                .get(&leaf)
                .ok_or_else(|| PermutationError::Unmatched {
                    address: leaf.to_string(),
                })?;
            for reference in references.iter().filter(|r| leaf.intersects(r)) {
                map.insert(
                    leaf.with_suffixes(reference, &leaf),
                    image.with_suffixes(reference, &leaf),
                );
            }
        }
        Ok(TreePair::from_bijection(LeafBijection::from_map(map))?)
    }

    /// `self` followed by `other`
    pub fn compose(&self, other: &TreePair) -> Result<TreePair> {
        debug!(
            left_blocks = self.num_blocks(),
            right_blocks = other.num_blocks(),
            "composing tree pairs"
        );
        let inverse = self.inverse();
        let mut first = inverse.refine_to(&other.left)?;
        let second = other.refine_to(&inverse.left)?;
        first.invert();
        let bijection = LeafBijection::multiply(&first.bijection, &second.bijection)?;
        let mut result = TreePair {
            left: first.left,
            right: second.right,
            bijection,
        };
        result.remove_exposed_carets()?;
        Ok(result)
    }

    /// `self` composed with itself `n` times; negative powers use the inverse
    pub fn power(&self, n: i64) -> Result<TreePair> {
        let base = if n < 0 { self.inverse() } else { self.clone() };
        let mut acc = TreePair::identity();
        for _ in 0..n.unsigned_abs() {
            acc = acc.compose(&base)?;
        }
        Ok(acc)
    }

    /// `self` conjugated by `by`: `by⁻¹`, then `self`, then `by`
    pub fn conjugate(&self, by: &TreePair) -> Result<TreePair> {
        by.inverse().compose(&self.compose(by)?)
    }

    /// Commutator of `self` and `other`
    pub fn commutator(&self, other: &TreePair) -> Result<TreePair> {
        other.inverse().compose(&other.conjugate(self)?)
    }

    /// Least `n <= max` with `selfⁿ` a single block, if any
    pub fn order(&self, max: i64) -> Result<Option<usize>> {
        if max <= 0 {
            return Err(StructureError::OutOfBounds {
                what: "maximum order",
                value: max,
                min: 1,
                max: i64::MAX,
            }
            .into());
        }
        let mut acc = TreePair::identity();
        for n in 1..=max as usize {
            acc = acc.compose(self)?;
            if acc.is_identity() {
                debug!(order = n, "found order");
                return Ok(Some(n));
            }
        }
        Ok(None)
    }
}
