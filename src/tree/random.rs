//! Random trees by random pairwise merging of subtrees

use rand::Rng;

use super::{ColoredTree, StructureError};
use crate::MAXCOL;

impl ColoredTree {
    /// Random tree with `leaves` leaves and colours in `1..=colors`,
    /// drawn from the thread-local generator.
    pub fn random(leaves: usize, colors: usize) -> Result<Self, StructureError> {
        Self::random_with(leaves, colors, &mut rand::rng())
    }

    /// Random tree drawn from `rng`.
    ///
    /// Starts from `leaves` single-leaf subtrees and repeatedly joins two
    /// distinct ones under a caret of a random colour.
    pub fn random_with<R: Rng + ?Sized>(
        leaves: usize,
        colors: usize,
        rng: &mut R,
    ) -> Result<Self, StructureError> {
        let structure = random_structure(leaves, colors, rng)?;
        Self::parse_structure(&structure)
    }
}

/// Prefix encoding of a random tree
pub(crate) fn random_structure<R: Rng + ?Sized>(
    leaves: usize,
    colors: usize,
    rng: &mut R,
) -> Result<String, StructureError> {
    if leaves == 0 {
        return Err(StructureError::OutOfBounds {
            what: "leaves",
            value: 0,
            min: 1,
            max: i64::MAX,
        });
    }
    if !(1..MAXCOL).contains(&colors) {
        return Err(StructureError::OutOfBounds {
            what: "colors",
            value: colors as i64,
            min: 1,
            max: (MAXCOL - 1) as i64,
        });
    }

    let mut blocks: Vec<String> = vec!["0".to_string(); leaves];
    while blocks.len() > 1 {
        let first = rng.random_range(0..blocks.len());
        let mut second = rng.random_range(0..blocks.len() - 1);
        if second >= first {
            second += 1;
        }
        let color = rng.random_range(1..=colors);
        let merged = format!("{color}{}{}", blocks[first], blocks[second]);
        // remove the higher index first so the lower one stays valid
        let (hi, lo) = (first.max(second), first.min(second));
        blocks.swap_remove(hi);
        blocks.swap_remove(lo);
        blocks.push(merged);
    }
    Ok(blocks.pop().unwrap_or_else(|| "0".to_string()))
}

/// Parse the parameters following `random`: exactly two integers
pub(crate) fn parse_request(params: &str) -> Result<(usize, usize), StructureError> {
    let invalid = || StructureError::InvalidRandomRequest {
        request: format!("random{params}"),
    };
    let tokens: Vec<&str> = params.split_whitespace().collect();
    let [leaves, colors] = tokens.as_slice() else {
        return Err(invalid());
    };
    let leaves: usize = leaves.parse().map_err(|_| invalid())?;
    let colors: usize = colors.parse().map_err(|_| invalid())?;
    Ok((leaves, colors))
}
