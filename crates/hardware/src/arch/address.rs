//! Address types and segments.
//!
//! An address type fixes the width and kind of an address space. A segment is
//! a contiguous, inclusive range of one address type; probes are only legal
//! for addresses that fall inside some segment of the probed buffer's type.

use crate::common::bits::mask;
use crate::config::AddressKind;

/// Index of an address type inside an [`ArchModel`](super::ArchModel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AddressTypeId(pub usize);

/// Index of a segment inside an [`ArchModel`](super::ArchModel).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub usize);

/// Width and kind of an address space.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AddressType {
    /// Identifier from the description.
    pub name: String,
    /// Width in bits, `1..=64`.
    pub width: u32,
    /// Virtual or physical.
    pub kind: AddressKind,
}

impl AddressType {
    /// Mask of the bits an address of this type may use.
    pub const fn mask(&self) -> u64 {
        mask(self.width)
    }
}

/// Linear translation from a segment into another address type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Translation {
    /// Address type translated into.
    pub target: AddressTypeId,
    /// Target address corresponding to the segment start.
    pub base: u64,
}

/// Contiguous range `[start, end]` of one address type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Segment {
    /// Address-argument identifier.
    pub name: String,
    /// Address type the range belongs to.
    pub address_type: AddressTypeId,
    /// First address, inclusive.
    pub start: u64,
    /// Last address, inclusive.
    pub end: u64,
    /// Optional mapping into another address type.
    pub translation: Option<Translation>,
}

impl Segment {
    /// Returns `true` if `addr` lies inside the segment.
    #[inline]
    pub const fn contains(&self, addr: u64) -> bool {
        self.start <= addr && addr <= self.end
    }

    /// Number of addresses covered, saturating at `u64::MAX`.
    pub const fn size(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    /// Translates `addr` into the target address type.
    ///
    /// Returns `None` when the segment has no translation, when `addr` is
    /// outside the segment, or when the result overflows.
    pub fn translate(&self, addr: u64) -> Option<(AddressTypeId, u64)> {
        let translation = self.translation?;
        if !self.contains(addr) {
            return None;
        }
        let offset = addr - self.start;
        translation
            .base
            .checked_add(offset)
            .map(|target| (translation.target, target))
    }
}
