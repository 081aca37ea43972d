//! Block ordering keyed on one colour
//!
//! Each colour path is treated as one "digit" of the address, with the
//! significant colour compared last. Blocks adjacent along that colour then
//! differ only in the final bit of the final digit, so they end up next to
//! each other in a sorted list.

use std::cmp::Ordering;

use bitvec::prelude::*;

use super::LeafAddress;
use crate::tree::StructureError;
use crate::{check_color, Color, MAXCOL};

/// Comparator placing blocks adjacent along `color` next to each other
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignificantColorOrder {
    color: Color,
}

impl SignificantColorOrder {
    /// Order keyed on `color` (must be `1..MAXCOL`)
    pub fn new(color: usize) -> Result<Self, StructureError> {
        Ok(Self {
            color: check_color(color)?,
        })
    }

    /// The colour compared last
    pub fn color(&self) -> Color {
        self.color
    }

    /// Compare two blocks
    pub fn compare(&self, a: &LeafAddress, b: &LeafAddress) -> Ordering {
        let sig = self.color as usize;
        (1..MAXCOL)
            .filter(|&c| c != sig)
            .chain(std::iter::once(sig))
            .map(|c| compare_paths(a.color_path(c), b.color_path(c)))
            .find(|ord| ord.is_ne())
            .unwrap_or(Ordering::Equal)
    }

    /// Sort blocks in place
    pub fn sort(&self, blocks: &mut [LeafAddress]) {
        blocks.sort_by(|a, b| self.compare(a, b));
    }
}

/// Lexicographic, a proper prefix first
#[inline]
fn compare_paths(a: &BitSlice, b: &BitSlice) -> Ordering {
    a.iter().by_vals().cmp(b.iter().by_vals())
}
