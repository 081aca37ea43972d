//! Tree pairs: elements of nV
//!
//! A [`TreePair`] holds a left tree, a right tree and a leaf bijection from
//! the left tree's blocks to the right tree's blocks. As a map of the cube it
//! sends each left block linearly onto its image block.
//!
//! Text form is `left,right,perm` (see [`LeafBijection`] for the array
//! semantics); the literal form used in expressions wraps it in braces.
//!
//! ```
//! use nvtrees::TreePair;
//!
//! let pair: TreePair = "{12000,20100,2 3 1}".parse()?;
//! assert_eq!(pair.num_blocks(), 3);
//! assert_eq!(pair.to_string(), "12000,20100,2 3 1");
//! # Ok::<(), nvtrees::NvError>(())
//! ```

mod algebra;
mod carets;
mod growth;
mod reduce;

pub use growth::growth;
pub use reduce::are_mergeable;

use std::fmt;
use std::str::FromStr;

use rand::Rng;

use crate::permutation::{format_array, LeafBijection, PermutationError};
use crate::tree::{ColoredTree, StructureError};
use crate::{NvError, Result};

/// Group element of nV as two trees and a leaf bijection
///
/// Invariant: both trees have as many leaves as the bijection has entries,
/// its domain is the left tree's leaf set and its codomain the right's.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreePair {
    left: ColoredTree,
    right: ColoredTree,
    bijection: LeafBijection,
}

impl TreePair {
    /// Assemble a pair, checking the bijection against both trees
    pub fn new(
        left: ColoredTree,
        right: ColoredTree,
        bijection: LeafBijection,
    ) -> std::result::Result<Self, PermutationError> {
        bijection.validate(&left, &right)?;
        Ok(Self {
            left,
            right,
            bijection,
        })
    }

    /// Pair from the three text components; `right` may be `same`
    pub fn from_parts(left: &str, right: &str, perm: &str) -> Result<Self> {
        let left: ColoredTree = left.trim().parse()?;
        let right = match right.trim() {
            "same" => left.clone(),
            other => other.parse()?,
        };
        let bijection = LeafBijection::parse(perm, &left, &right)?;
        Ok(Self {
            left,
            right,
            bijection,
        })
    }

    /// The identity `0,0,1`
    pub fn identity() -> Self {
        let leaf = ColoredTree::leaf();
        let mut bijection = LeafBijection::new();
        bijection.insert(Default::default(), Default::default());
        Self {
            left: leaf.clone(),
            right: leaf,
            bijection,
        }
    }

    /// Two random trees with `leaves` leaves and a random bijection
    pub fn random(leaves: usize, colors: usize) -> Result<Self> {
        Self::random_with(leaves, colors, &mut rand::rng())
    }

    /// Random pair drawn from `rng`
    pub fn random_with<R: Rng + ?Sized>(leaves: usize, colors: usize, rng: &mut R) -> Result<Self> {
        let left = ColoredTree::random_with(leaves, colors, rng)?;
        let right = ColoredTree::random_with(leaves, colors, rng)?;
        let bijection = LeafBijection::random_with(&left, &right, rng)?;
        Ok(Self {
            left,
            right,
            bijection,
        })
    }

    /// Pair whose trees are rebuilt from the bijection's domain and codomain
    pub fn from_bijection(bijection: LeafBijection) -> std::result::Result<Self, StructureError> {
        let left = ColoredTree::from_pattern(bijection.keys().cloned())?;
        let right = ColoredTree::from_pattern(bijection.values().cloned())?;
        Ok(Self {
            left,
            right,
            bijection,
        })
    }

    /// Left (domain) tree
    #[inline]
    pub fn left(&self) -> &ColoredTree {
        &self.left
    }

    /// Right (range) tree
    #[inline]
    pub fn right(&self) -> &ColoredTree {
        &self.right
    }

    /// Leaf bijection
    #[inline]
    pub fn bijection(&self) -> &LeafBijection {
        &self.bijection
    }

    /// Number of blocks in either pattern
    #[inline]
    pub fn num_blocks(&self) -> usize {
        self.bijection.len()
    }

    /// True for a single-block pair. Only meaningful after reduction or
    /// caret cancellation.
    pub fn is_identity(&self) -> bool {
        self.num_blocks() == 1
    }

    /// Permutation array relative to the current trees
    pub fn permutation_array(&self) -> std::result::Result<Vec<usize>, PermutationError> {
        self.bijection.to_array(&self.left, &self.right)
    }

    /// Brace-wrapped text form, as accepted in expressions
    pub fn to_literal(&self) -> String {
        format!("{{{}}}", self)
    }

    /// Swap the trees and reverse the bijection
    pub fn invert(&mut self) {
        std::mem::swap(&mut self.left, &mut self.right);
        self.bijection.invert();
    }

    /// Reset the bijection to match leaves in DFS order
    pub fn reset_bijection(&mut self) -> std::result::Result<(), PermutationError> {
        self.bijection = LeafBijection::identity(&self.left, &self.right)?;
        Ok(())
    }

    /// True unless both trees use only the root's colour
    pub fn is_multi_dimensional(&self) -> bool {
        let color = self.left.color(self.left.root());
        !subtree_matches_color(&self.left, color) || !subtree_matches_color(&self.right, color)
    }
}

fn subtree_matches_color(tree: &ColoredTree, color: crate::Color) -> bool {
    tree.preorder()
        .into_iter()
        .all(|id| tree.is_leaf(id) || tree.color(id) == color)
}

impl Default for TreePair {
    fn default() -> Self {
        Self::identity()
    }
}

impl FromStr for TreePair {
    type Err = NvError;

    /// `left,right,perm`, `left,right`, `left,same` or `random N C`,
    /// optionally wrapped in braces
    fn from_str(s: &str) -> Result<Self> {
        let text = s.trim();
        let body = text
            .strip_prefix('{')
            .and_then(|t| t.strip_suffix('}'))
            .unwrap_or(text)
            .trim();
        let malformed = || StructureError::MalformedPair {
            text: s.to_string(),
        };

        if let Some(params) = body.strip_prefix("random") {
            let mut numbers = params.split_whitespace().map(str::parse::<usize>);
            return match (numbers.next(), numbers.next(), numbers.next()) {
                (Some(Ok(leaves)), Some(Ok(colors)), None) => Self::random(leaves, colors),
                _ => Err(malformed().into()),
            };
        }

        let parts: Vec<&str> = body.split(',').collect();
        if parts.iter().any(|p| p.trim().is_empty()) {
            return Err(malformed().into());
        }
        match parts.as_slice() {
            [left, right] => Self::from_parts(left, right, "id"),
            [left, right, perm] => Self::from_parts(left, right, perm),
            _ => Err(malformed().into()),
        }
    }
}

impl fmt::Display for TreePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},", self.left, self.right)?;
        match self.permutation_array() {
            Ok(perm) => write!(f, "{}", format_array(&perm)),
            Err(err) => write!(f, "<broken bijection: {}>", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::StructureError;
    use test_case::test_case;

    #[test]
    fn test_literal_round_trip() {
        let pair: TreePair = "{12000,20100,2 3 1}".parse().unwrap();
        assert_eq!(pair.left().leaf_count(), 3);
        assert_eq!(pair.right().leaf_count(), 3);
        assert_eq!(pair.num_blocks(), 3);
        assert_eq!(pair.permutation_array().unwrap(), vec![2, 3, 1]);
        assert_eq!(pair.to_literal(), "{12000,20100,2 3 1}");
        let again: TreePair = pair.to_literal().parse().unwrap();
        assert_eq!(again, pair);
    }

    #[test_case("100,100", "100,100,1 2" ; "identity implied")]
    #[test_case("{1200200,same}", "1200200,1200200,1 2 3 4" ; "same right tree")]
    #[test_case(" 0 , 0 , 1 ", "0,0,1" ; "whitespace")]
    fn test_text_forms(input: &str, expected: &str) {
        let pair: TreePair = input.parse().unwrap();
        assert_eq!(pair.to_string(), expected);
    }

    #[test]
    fn test_random_pair() {
        let pair: TreePair = "{random 6 3}".parse().unwrap();
        assert_eq!(pair.num_blocks(), 6);
        assert!(pair
            .bijection()
            .validate(pair.left(), pair.right())
            .is_ok());
    }

    #[test]
    fn test_malformed_pairs() {
        assert!(matches!(
            "100".parse::<TreePair>(),
            Err(NvError::Structure(StructureError::MalformedPair { .. }))
        ));
        assert!(matches!(
            "random 3".parse::<TreePair>(),
            Err(NvError::Structure(StructureError::MalformedPair { .. }))
        ));
        assert!(matches!(
            "100,12000".parse::<TreePair>(),
            Err(NvError::Permutation(PermutationError::LeafCountMismatch { .. }))
        ));
        assert!(matches!(
            "12000,20100,1 2".parse::<TreePair>(),
            Err(NvError::Permutation(PermutationError::LengthMismatch { .. }))
        ));
    }

    #[test_case("{100,,100}" ; "empty middle")]
    #[test_case("100,100," ; "trailing comma")]
    #[test_case(",100,100" ; "leading comma")]
    #[test_case("100, ,100,2 1" ; "blank part")]
    #[test_case("{}" ; "empty braces")]
    fn test_empty_parts_are_rejected(input: &str) {
        assert!(matches!(
            input.parse::<TreePair>(),
            Err(NvError::Structure(StructureError::MalformedPair { .. }))
        ));
    }

    #[test]
    fn test_invert_swaps_trees() {
        let mut pair: TreePair = "12000,20100,2 3 1".parse().unwrap();
        pair.invert();
        assert_eq!(pair.to_string(), "20100,12000,3 1 2");
        pair.reset_bijection().unwrap();
        assert_eq!(pair.permutation_array().unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_multi_dimensional() {
        let flat: TreePair = "11000,10100".parse().unwrap();
        assert!(!flat.is_multi_dimensional());
        let mixed: TreePair = "12000,10100".parse().unwrap();
        assert!(mixed.is_multi_dimensional());
        assert!(!TreePair::identity().is_multi_dimensional());
    }

    #[test]
    fn test_new_validates() {
        let left: ColoredTree = "100".parse().unwrap();
        let right: ColoredTree = "200".parse().unwrap();
        let bij = LeafBijection::identity(&left, &left).unwrap();
        assert!(TreePair::new(left.clone(), right.clone(), bij).is_err());
        let ok = LeafBijection::identity(&left, &right).unwrap();
        assert!(TreePair::new(left, right, ok).is_ok());
    }
}
