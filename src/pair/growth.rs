//! Growth function of a finitely generated semigroup
//!
//! Breadth-first by word length. Elements are told apart by a blake3
//! fingerprint of their canonical string, so no pairwise comparison is
//! ever needed. Each layer is composed in parallel.

use std::collections::HashSet;

use rayon::prelude::*;
use tracing::debug;

use super::TreePair;
use crate::Result;

fn fingerprint(canonical: &TreePair) -> blake3::Hash {
    blake3::hash(canonical.to_string().as_bytes())
}

/// Cumulative number of distinct elements expressible as words of length
/// `0..=n` over `generators`. Entry 0 is always 1 (the identity).
pub fn growth(generators: &[TreePair], n: usize) -> Result<Vec<usize>> {
    let mut counts = Vec::with_capacity(n + 1);
    counts.push(1);

    let identity = TreePair::identity().reduce()?;
    let mut seen: HashSet<blake3::Hash> = HashSet::new();
    seen.insert(fingerprint(&identity));
    let mut frontier = vec![identity];

    for length in 1..=n {
        let candidates: Vec<(blake3::Hash, TreePair)> = frontier
            .par_iter()
            .flat_map_iter(|word| {
                generators.iter().map(move |g| {
                    let element = word.compose(g)?.reduce()?;
                    Ok((fingerprint(&element), element))
                })
            })
            .collect::<Result<_>>()?;

        let mut next = Vec::new();
        for (key, element) in candidates {
            if seen.insert(key) {
                next.push(element);
            }
        }
        debug!(length, new = next.len(), total = seen.len(), "growth layer");
        counts.push(seen.len());
        frontier = next;
    }
    Ok(counts)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_growth_of_involution_plateaus() {
        let swap: TreePair = "100,100,2 1".parse().unwrap();
        let counts = growth(&[swap], 5).unwrap();
        assert_eq!(counts, vec![1, 2, 2, 2, 2, 2]);
    }

    #[test]
    fn test_growth_of_free_element() {
        let x0: TreePair = "11000,10100".parse().unwrap();
        let counts = growth(&[x0], 4).unwrap();
        assert_eq!(counts, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_growth_zero_length() {
        assert_eq!(growth(&[], 0).unwrap(), vec![1]);
        assert_eq!(growth(&[], 3).unwrap(), vec![1, 1, 1, 1]);
    }
}
