//! Leaf bijections
//!
//! A [`LeafBijection`] maps the leaf addresses of a left tree onto the leaf
//! addresses of a right tree. The trees themselves are owned by the tree
//! pair; operations that need leaf order take them as arguments.
//!
//! ## Array form
//!
//! For right-tree leaf `i` (DFS order, 0-based), `perm[i]` is the 1-based
//! DFS index of the left-tree leaf mapped onto it:
//!
//! ```text
//! left leaves   a b c
//! perm          2 3 1     b -> right[0], c -> right[1], a -> right[2]
//! ```

use std::collections::{HashMap, HashSet};
use std::ptr;

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;
use tracing::trace;

use crate::address::LeafAddress;
use crate::tree::ColoredTree;

/// Bijection could not be built, checked or combined
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PermutationError {
    /// The two trees have different leaf counts
    #[error("trees have different numbers of leaves: {left} and {right}")]
    LeafCountMismatch {
        /// Leaves in the left tree
        left: usize,
        /// Leaves in the right tree
        right: usize,
    },

    /// Wrong number of entries in a permutation array
    #[error("wrong number of entries in permutation: expected {expected}, found {found}")]
    LengthMismatch {
        /// Leaf count
        expected: usize,
        /// Entries supplied
        found: usize,
    },

    /// Entry outside `1..=n`
    #[error("permutation entry {entry} out of range 1..={max}")]
    OutOfRange {
        /// Offending entry
        entry: i64,
        /// Leaf count
        max: usize,
    },

    /// Entry that is not an integer
    #[error("invalid permutation entry '{token}'")]
    InvalidEntry {
        /// Offending token
        token: String,
    },

    /// Entry listed twice
    #[error("permutation entry {entry} repeated: not a bijection")]
    NotBijective {
        /// Repeated entry
        entry: usize,
    },

    /// A leaf without a partner, or a partner that is not a leaf
    #[error("leaf {address} has no match")]
    Unmatched {
        /// The unmatched address
        address: String,
    },

    /// Both operands of a multiplication are the same instance
    #[error("cannot multiply a bijection with itself; multiply a copy instead")]
    Aliased,

    /// Codomain of the first factor is not the domain of the second
    #[error("codomain of the first factor differs from the domain of the second")]
    PatternMismatch,
}

/// Map from left-tree leaf addresses to right-tree leaf addresses
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LeafBijection {
    map: HashMap<LeafAddress, LeafAddress>,
}

impl LeafBijection {
    /// Empty bijection
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a prepared map (no validation)
    pub fn from_map(map: HashMap<LeafAddress, LeafAddress>) -> Self {
        Self { map }
    }

    /// Build from a permutation array (see module docs for the semantics)
    pub fn from_array(
        left: &ColoredTree,
        right: &ColoredTree,
        perm: &[i64],
    ) -> Result<Self, PermutationError> {
        let left_leaves = left.detailed_leaves();
        let right_leaves = right.detailed_leaves();
        let n = check_leaf_counts(left_leaves.len(), right_leaves.len())?;
        if perm.len() != n {
            return Err(PermutationError::LengthMismatch {
                expected: n,
                found: perm.len(),
            });
        }

        let mut seen = vec![false; n];
        let mut map = HashMap::with_capacity(n);
        for (i, &entry) in perm.iter().enumerate() {
            if entry < 1 || entry as usize > n {
                return Err(PermutationError::OutOfRange { entry, max: n });
            }
            let index = entry as usize - 1;
            if std::mem::replace(&mut seen[index], true) {
                return Err(PermutationError::NotBijective {
                    entry: entry as usize,
                });
            }
            map.insert(left_leaves[index].clone(), right_leaves[i].clone());
        }
        Ok(Self { map })
    }

    /// Leaves matched in DFS order
    pub fn identity(left: &ColoredTree, right: &ColoredTree) -> Result<Self, PermutationError> {
        let left_leaves = left.detailed_leaves();
        let right_leaves = right.detailed_leaves();
        check_leaf_counts(left_leaves.len(), right_leaves.len())?;
        Ok(Self {
            map: left_leaves.into_iter().zip(right_leaves).collect(),
        })
    }

    /// Uniformly random bijection from the thread-local generator
    pub fn random(left: &ColoredTree, right: &ColoredTree) -> Result<Self, PermutationError> {
        Self::random_with(left, right, &mut rand::rng())
    }

    /// Uniformly random bijection drawn from `rng`
    pub fn random_with<R: Rng + ?Sized>(
        left: &ColoredTree,
        right: &ColoredTree,
        rng: &mut R,
    ) -> Result<Self, PermutationError> {
        let n = check_leaf_counts(left.leaf_count(), right.leaf_count())?;
        let mut perm: Vec<i64> = (1..=n as i64).collect();
        perm.shuffle(rng);
        Self::from_array(left, right, &perm)
    }

    /// Build from text: `id`, `random`, or whitespace-separated entries
    pub fn parse(text: &str, left: &ColoredTree, right: &ColoredTree) -> Result<Self, PermutationError> {
        match text.trim() {
            "id" => Self::identity(left, right),
            "random" => Self::random(left, right),
            entries => Self::from_array(left, right, &parse_array(entries)?),
        }
    }

    /// Array form relative to the given trees
    pub fn to_array(&self, left: &ColoredTree, right: &ColoredTree) -> Result<Vec<usize>, PermutationError> {
        let right_index: HashMap<LeafAddress, usize> = right
            .detailed_leaves()
            .into_iter()
            .enumerate()
            .map(|(i, a)| (a, i))
            .collect();
        let mut out = vec![0; self.map.len()];
        for (i, leaf) in left.detailed_leaves().into_iter().enumerate() {
            let unmatched = || PermutationError::Unmatched {
                address: leaf.to_string(),
            };
            let image = self.map.get(&leaf).ok_or_else(unmatched)?;
            let slot = right_index.get(image).copied().ok_or_else(unmatched)?;
            *out.get_mut(slot).ok_or_else(unmatched)? = i + 1;
        }
        Ok(out)
    }

    /// Image of a left leaf
    #[inline]
    pub fn get(&self, leaf: &LeafAddress) -> Option<&LeafAddress> {
        self.map.get(leaf)
    }

    /// Add or replace a mapping; returns the previous image
    pub fn insert(&mut self, leaf: LeafAddress, image: LeafAddress) -> Option<LeafAddress> {
        self.map.insert(leaf, image)
    }

    /// Remove a mapping; returns the image
    pub fn remove(&mut self, leaf: &LeafAddress) -> Option<LeafAddress> {
        self.map.remove(leaf)
    }

    /// Check if `leaf` is in the domain
    pub fn contains_key(&self, leaf: &LeafAddress) -> bool {
        self.map.contains_key(leaf)
    }

    /// Check if `image` is in the codomain (linear scan)
    pub fn contains_value(&self, image: &LeafAddress) -> bool {
        self.map.values().any(|v| v == image)
    }

    /// Number of mapped leaves
    #[inline]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// True when nothing is mapped
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Domain addresses, arbitrary order
    pub fn keys(&self) -> impl Iterator<Item = &LeafAddress> {
        self.map.keys()
    }

    /// Codomain addresses, arbitrary order
    pub fn values(&self) -> impl Iterator<Item = &LeafAddress> {
        self.map.values()
    }

    /// `(leaf, image)` pairs, arbitrary order
    pub fn iter(&self) -> impl Iterator<Item = (&LeafAddress, &LeafAddress)> {
        self.map.iter()
    }

    /// Reverse every mapping (the owning pair swaps its trees alongside)
    pub fn invert(&mut self) {
        self.map = std::mem::take(&mut self.map)
            .into_iter()
            .map(|(k, v)| (v, k))
            .collect();
    }

    /// Inverted copy
    pub fn inverted(&self) -> Self {
        let mut out = self.clone();
        out.invert();
        out
    }

    /// Pointwise composite `p ↦ b(a(p))`
    ///
    /// `a`'s codomain must be exactly `b`'s domain. Passing the same instance
    /// twice is rejected.
    pub fn multiply(a: &LeafBijection, b: &LeafBijection) -> Result<Self, PermutationError> {
        if ptr::eq(a, b) {
            return Err(PermutationError::Aliased);
        }
        if a.len() != b.len() {
            return Err(PermutationError::PatternMismatch);
        }
        let mut map = HashMap::with_capacity(a.len());
        for (leaf, mid) in &a.map {
            let image = b.map.get(mid).ok_or(PermutationError::PatternMismatch)?;
            map.insert(leaf.clone(), image.clone());
        }
        trace!(blocks = map.len(), "multiplied bijections");
        Ok(Self { map })
    }

    /// Check domain, codomain and injectivity against the trees
    pub fn validate(&self, left: &ColoredTree, right: &ColoredTree) -> Result<(), PermutationError> {
        let left_leaves: HashSet<LeafAddress> = left.detailed_leaves().into_iter().collect();
        let right_leaves: HashSet<LeafAddress> = right.detailed_leaves().into_iter().collect();
        check_leaf_counts(left_leaves.len(), right_leaves.len())?;
        if self.map.len() != left_leaves.len() {
            return Err(PermutationError::LengthMismatch {
                expected: left_leaves.len(),
                found: self.map.len(),
            });
        }
        let mut images = HashSet::with_capacity(self.map.len());
        for (leaf, image) in &self.map {
            if !left_leaves.contains(leaf) {
                return Err(PermutationError::Unmatched {
                    address: leaf.to_string(),
                });
            }
            if !right_leaves.contains(image) || !images.insert(image) {
                return Err(PermutationError::Unmatched {
                    address: image.to_string(),
                });
            }
        }
        Ok(())
    }
}

fn check_leaf_counts(left: usize, right: usize) -> Result<usize, PermutationError> {
    if left == right {
        Ok(left)
    } else {
        Err(PermutationError::LeafCountMismatch { left, right })
    }
}

/// Parse whitespace-separated integers
pub fn parse_array(text: &str) -> Result<Vec<i64>, PermutationError> {
    text.split_whitespace()
        .map(|token| {
            token.parse().map_err(|_| PermutationError::InvalidEntry {
                token: token.to_string(),
            })
        })
        .collect()
}

/// Space-separated array text
pub fn format_array(perm: &[usize]) -> String {
    perm.iter()
        .map(|p| p.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn trees() -> (ColoredTree, ColoredTree) {
        ("12000".parse().unwrap(), "20100".parse().unwrap())
    }

    #[test]
    fn test_array_semantics() {
        let (left, right) = trees();
        let bij = LeafBijection::from_array(&left, &right, &[2, 3, 1]).unwrap();
        let l = left.detailed_leaves();
        let r = right.detailed_leaves();
        assert_eq!(bij.get(&l[1]), Some(&r[0]));
        assert_eq!(bij.get(&l[2]), Some(&r[1]));
        assert_eq!(bij.get(&l[0]), Some(&r[2]));
        assert_eq!(bij.to_array(&left, &right).unwrap(), vec![2, 3, 1]);
    }

    #[test]
    fn test_construction_errors() {
        let (left, right) = trees();
        assert_eq!(
            LeafBijection::parse("1 2", &left, &right),
            Err(PermutationError::LengthMismatch {
                expected: 3,
                found: 2
            })
        );
        assert_eq!(
            LeafBijection::parse("1 1 2", &left, &right),
            Err(PermutationError::NotBijective { entry: 1 })
        );
        assert_eq!(
            LeafBijection::parse("0 1 2", &left, &right),
            Err(PermutationError::OutOfRange { entry: 0, max: 3 })
        );
        assert!(matches!(
            LeafBijection::parse("1 x 2", &left, &right),
            Err(PermutationError::InvalidEntry { .. })
        ));
        let small: ColoredTree = "100".parse().unwrap();
        assert_eq!(
            LeafBijection::identity(&left, &small),
            Err(PermutationError::LeafCountMismatch { left: 3, right: 2 })
        );
    }

    #[test]
    fn test_keywords() {
        let (left, right) = trees();
        let id = LeafBijection::parse("id", &left, &right).unwrap();
        assert_eq!(id.to_array(&left, &right).unwrap(), vec![1, 2, 3]);
        let random = LeafBijection::parse(" random ", &left, &right).unwrap();
        assert!(random.validate(&left, &right).is_ok());
    }

    #[test]
    fn test_random_is_permutation() {
        let left: ColoredTree = "111100000".parse().unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let bij = LeafBijection::random_with(&left, &left, &mut rng).unwrap();
        let mut arr = bij.to_array(&left, &left).unwrap();
        arr.sort_unstable();
        assert_eq!(arr, (1..=5).collect::<Vec<_>>());
    }

    #[test]
    fn test_invert_and_multiply() {
        let (left, right) = trees();
        let bij = LeafBijection::from_array(&left, &right, &[2, 3, 1]).unwrap();
        let inv = bij.inverted();
        assert_eq!(inv.to_array(&right, &left).unwrap(), vec![3, 1, 2]);
        let round = LeafBijection::multiply(&bij, &inv).unwrap();
        assert!(round.iter().all(|(k, v)| k == v));
        assert_eq!(
            LeafBijection::multiply(&bij, &bij),
            Err(PermutationError::Aliased)
        );
        let copy = bij.clone();
        assert_eq!(
            LeafBijection::multiply(&bij, &copy),
            Err(PermutationError::PatternMismatch)
        );
    }

    #[test]
    fn test_validate_catches_foreign_leaf() {
        let (left, right) = trees();
        let mut bij = LeafBijection::identity(&left, &right).unwrap();
        assert!(bij.validate(&left, &right).is_ok());
        let leaf = left.detailed_leaves()[0].clone();
        let image = bij.remove(&leaf).unwrap();
        bij.insert("5:1".parse().unwrap(), image);
        assert!(bij.validate(&left, &right).is_err());
    }

    #[test]
    fn test_format_array() {
        assert_eq!(format_array(&[2, 3, 1]), "2 3 1");
        assert_eq!(parse_array(" 2  3 1 ").unwrap(), vec![2, 3, 1]);
    }
}
