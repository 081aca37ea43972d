//! Shape-independent leaf coordinates
//!
//! A leaf of a coloured tree is a block of the decomposed hypercube.
//! Its address records, for each colour separately, the left(0)/right(1)
//! choices made at ancestors of that colour:
//!
//! ```text
//! path    0 1 1 0 1 0
//! colours 1 2 1 2 2 3   ->   1:01  2:101  3:0
//! ```
//!
//! Two leaves of any two trees have equal addresses iff they are the same
//! block, so addresses are how leaves are correlated across trees.

mod ordering;

pub use ordering::SignificantColorOrder;

use std::fmt;
use std::str::FromStr;

use bitvec::prelude::*;

use crate::tree::StructureError;
use crate::{check_color, Color, MAXCOL};

/// Which child of a cut a block lies in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Lower half (bit 0)
    Left,
    /// Upper half (bit 1)
    Right,
}

impl Direction {
    /// Direction encoded by a path bit
    #[inline]
    pub fn from_bit(bit: bool) -> Self {
        if bit {
            Direction::Right
        } else {
            Direction::Left
        }
    }

    /// Path bit of this direction
    #[inline]
    pub fn bit(self) -> bool {
        matches!(self, Direction::Right)
    }

    /// Path character (`'0'` / `'1'`)
    #[inline]
    pub fn symbol(self) -> char {
        if self.bit() {
            '1'
        } else {
            '0'
        }
    }
}

/// Per-colour cut history of a block ("SuperPath")
///
/// Slot 0 is never written, so equality and hashing only see real colours.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct LeafAddress {
    paths: [BitVec; MAXCOL],
}

impl LeafAddress {
    /// Address of the whole cube (no cuts)
    pub fn new() -> Self {
        Self::default()
    }

    /// Path in colour `color`; empty for out-of-range colours
    pub fn color_path(&self, color: usize) -> &BitSlice {
        if (1..MAXCOL).contains(&color) {
            self.paths[color].as_bitslice()
        } else {
            BitSlice::empty()
        }
    }

    /// Number of cuts recorded in `color`
    #[inline]
    pub fn path_len(&self, color: usize) -> usize {
        self.color_path(color).len()
    }

    /// True for the address of the whole cube
    pub fn is_empty(&self) -> bool {
        self.paths.iter().all(|p| p.is_empty())
    }

    /// Total number of cuts: the block volume is `2^-size_log`
    pub fn size_log(&self) -> usize {
        self.paths.iter().map(|p| p.len()).sum()
    }

    /// Go down one level in `color` (caret inserted below this block)
    pub fn append_down(&mut self, color: usize, direction: Direction) -> Result<(), StructureError> {
        let c = check_color(color)? as usize;
        self.paths[c].push(direction.bit());
        Ok(())
    }

    /// Drop the last choice in `color`, returning it
    ///
    /// The result is the parent block along `color`, which is not necessarily
    /// the address of the tree parent.
    pub fn go_up(&mut self, color: usize) -> Result<Direction, StructureError> {
        let c = check_color(color)? as usize;
        self.paths[c]
            .pop()
            .map(Direction::from_bit)
            .ok_or(StructureError::EmptyColorPath { color: c as Color })
    }

    /// Drop the first choice in `color`, returning it
    ///
    /// Used while descending from a root of that colour: the remainder is the
    /// address relative to the chosen child.
    pub fn eat_down(&mut self, color: usize) -> Result<Direction, StructureError> {
        let c = check_color(color)? as usize;
        if self.paths[c].is_empty() {
            return Err(StructureError::EmptyColorPath { color: c as Color });
        }
        Ok(Direction::from_bit(self.paths[c].remove(0)))
    }

    /// Copy of this address one level down in `color`
    pub fn child(&self, color: usize, direction: Direction) -> Result<Self, StructureError> {
        let mut child = self.clone();
        child.append_down(color, direction)?;
        Ok(child)
    }

    /// Copy of this address one level up in `color`
    pub fn parent_along(&self, color: usize) -> Result<Self, StructureError> {
        let mut parent = self.clone();
        parent.go_up(color)?;
        Ok(parent)
    }

    /// Colour along which `self` and `other` are adjacent halves of one block
    ///
    /// That is the case when all colour paths agree except one, and that one
    /// differs only in its final bit.
    pub fn is_adjacent_to(&self, other: &LeafAddress) -> Option<Color> {
        let mut along = None;
        for color in 1..MAXCOL {
            let a = &self.paths[color];
            let b = &other.paths[color];
            if a == b {
                continue;
            }
            if along.is_some() || a.len() != b.len() {
                return None;
            }
            let stem = a.len() - 1;
            if a[..stem] != b[..stem] {
                return None;
            }
            along = Some(color as Color);
        }
        along
    }

    /// True when the two blocks overlap in the cube
    ///
    /// Dyadic intervals overlap iff one path is a prefix of the other, in
    /// every colour.
    pub fn intersects(&self, other: &LeafAddress) -> bool {
        (1..MAXCOL).all(|c| {
            let (a, b) = (&self.paths[c], &other.paths[c]);
            let n = a.len().min(b.len());
            a[..n] == b[..n]
        })
    }

    /// Extend every colour path by the part of `reference` lying beyond
    /// `anchor`'s path length in that colour.
    ///
    /// With `anchor == self` this is the common refinement of two
    /// intersecting blocks; applying the same suffixes to the image block
    /// keeps a bijection linear.
    pub(crate) fn with_suffixes(&self, reference: &LeafAddress, anchor: &LeafAddress) -> Self {
        let mut out = self.clone();
        for c in 1..MAXCOL {
            let skip = anchor.paths[c].len();
            let r = &reference.paths[c];
            if r.len() > skip {
                out.paths[c].extend_from_bitslice(&r[skip..]);
            }
        }
        out
    }

    /// Width of the block along dimension `color`, as a fraction of the unit
    /// interval. Drawing only.
    pub fn width(&self, color: usize) -> f64 {
        0.5f64.powi(self.path_len(color) as i32)
    }

    /// Lower corner of the block along dimension `color`. Drawing only.
    pub fn offset(&self, color: usize) -> f64 {
        let mut power = 1.0;
        let mut acc = 0.0;
        for bit in self.color_path(color).iter().by_vals() {
            power /= 2.0;
            if bit {
                acc += power;
            }
        }
        acc
    }
}

impl fmt::Display for LeafAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ ")?;
        for (c, path) in self.paths.iter().enumerate().skip(1) {
            if path.is_empty() {
                continue;
            }
            write!(f, "{}:", c)?;
            for bit in path.iter().by_vals() {
                write!(f, "{}", Direction::from_bit(bit).symbol())?;
            }
            write!(f, "; ")?;
        }
        write!(f, "]")
    }
}

impl FromStr for LeafAddress {
    type Err = StructureError;

    /// Accepts the `Display` form as well as bare `1:01 2:1` lists.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || StructureError::MalformedAddress { text: s.to_string() };
        let body = s.trim().trim_start_matches('[').trim_end_matches(']');
        let mut address = LeafAddress::new();
        for token in body.split(|ch: char| ch == ';' || ch.is_whitespace()) {
            if token.is_empty() {
                continue;
            }
            let (color, bits) = token.split_once(':').ok_or_else(malformed)?;
            let color: usize = color.parse().map_err(|_| malformed())?;
            check_color(color)?;
            if !address.paths[color].is_empty() {
                return Err(malformed());
            }
            for ch in bits.chars() {
                let direction = match ch {
                    '0' => Direction::Left,
                    '1' => Direction::Right,
                    _ => return Err(malformed()),
                };
                address.append_down(color, direction)?;
            }
        }
        Ok(address)
    }
}
