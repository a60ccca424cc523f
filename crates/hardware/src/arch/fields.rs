//! Bit-field tracker.
//!
//! A `FieldSet` records which bit positions of a fixed-width value are still
//! covered, as an ascending list of disjoint, maximal closed intervals. It is
//! used to carve an address into disjoint fields: start from the full width,
//! exclude the fields already assigned, and whatever remains is the next field.

use crate::common::bits::range_mask;

/// Ordered set of disjoint closed bit intervals over a fixed width.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FieldSet {
    width: u32,
    intervals: Vec<(u32, u32)>,
}

impl FieldSet {
    /// Creates a set covering `[0, width - 1]`.
    ///
    /// A zero width yields an empty set.
    pub fn new(width: u32) -> Self {
        let intervals = if width == 0 {
            Vec::new()
        } else {
            vec![(0, width - 1)]
        };
        Self { width, intervals }
    }

    /// Total width the set was created with.
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Remaining intervals, ascending by low bound.
    pub fn intervals(&self) -> &[(u32, u32)] {
        &self.intervals
    }

    /// Returns `true` when no bit is covered.
    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    /// Number of covered bits.
    pub fn len(&self) -> u32 {
        self.intervals.iter().map(|&(lo, hi)| hi - lo + 1).sum()
    }

    /// Removes `[lo, hi]` from the covered range.
    ///
    /// Bits that are already excluded are ignored, so the operation is
    /// idempotent. An interval strictly containing the range is split in two;
    /// intervals left empty are dropped. `lo > hi` is a no-op and `hi` is
    /// clamped to the width.
    pub fn exclude(&mut self, lo: u32, hi: u32) {
        if lo > hi || self.width == 0 || lo >= self.width {
            return;
        }
        let hi = hi.min(self.width - 1);

        let mut kept = Vec::with_capacity(self.intervals.len() + 1);
        for &(a, b) in &self.intervals {
            if b < lo || a > hi {
                kept.push((a, b));
                continue;
            }
            if a < lo {
                kept.push((a, lo - 1));
            }
            if b > hi {
                kept.push((hi + 1, b));
            }
        }
        self.intervals = kept;
    }

    /// Removes every interval.
    pub fn exclude_all(&mut self) {
        self.intervals.clear();
    }

    /// Mask of all covered bits.
    pub fn mask(&self) -> u64 {
        self.intervals
            .iter()
            .fold(0, |acc, &(lo, hi)| acc | range_mask(lo, hi))
    }

    /// Gathers the covered bits of `value` into a packed integer.
    ///
    /// The lowest interval supplies the least-significant bits of the result.
    pub fn extract(&self, value: u64) -> u64 {
        let mut out = 0;
        let mut shift = 0;
        for &(lo, hi) in &self.intervals {
            let field = (value & range_mask(lo, hi)) >> lo;
            out |= field << shift;
            shift += hi - lo + 1;
        }
        out
    }

    /// Scatters a packed `field` into the covered bits of `value`.
    ///
    /// Inverse of [`FieldSet::extract`]: uncovered bits of `value` are
    /// preserved and excess high bits of `field` are dropped.
    pub fn deposit(&self, value: u64, field: u64) -> u64 {
        let mut out = value & !self.mask();
        let mut shift = 0;
        for &(lo, hi) in &self.intervals {
            let len = hi - lo + 1;
            let part = if shift >= 64 { 0 } else { field >> shift };
            out |= (part << lo) & range_mask(lo, hi);
            shift += len;
        }
        out
    }
}
