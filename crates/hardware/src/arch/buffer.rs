//! Associative buffer declarations and their address decomposition.
//!
//! A buffer is split into sets and ways. The address it is probed with is
//! decomposed into three disjoint fields: the line offset (low bits), the set
//! index (next `log2(sets)` bits) and the tag (everything left). The fields are
//! computed with a [`FieldSet`] by successive exclusion.

use super::address::AddressTypeId;
use super::fields::FieldSet;
use crate::config::ReplacementPolicy;

/// Handle of a buffer inside an [`ArchModel`](super::ArchModel) arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BufferId(pub usize);

/// Offset/index/tag decomposition of an address.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    /// Line-offset bits.
    pub offset: FieldSet,
    /// Set-index bits.
    pub index: FieldSet,
    /// Tag bits.
    pub tag: FieldSet,
}

impl FieldLayout {
    /// Builds the layout for an address of `width` bits.
    ///
    /// The offset occupies `[0, line_bits - 1]` and the index the following
    /// `index_bits` bits. The tag is whatever remains after excluding both.
    pub fn new(width: u32, line_bits: u32, index_bits: u32) -> Self {
        let index_end = line_bits + index_bits;

        let mut offset = FieldSet::new(width);
        let mut index = FieldSet::new(width);
        let mut tag = FieldSet::new(width);

        if line_bits == 0 {
            offset.exclude_all();
        } else {
            offset.exclude(line_bits, width.saturating_sub(1));
            index.exclude(0, line_bits - 1);
            tag.exclude(0, line_bits - 1);
        }

        if index_bits == 0 {
            index.exclude_all();
        } else {
            index.exclude(index_end, width.saturating_sub(1));
            tag.exclude(line_bits, index_end - 1);
        }

        Self { offset, index, tag }
    }
}

/// An associative storage unit (cache line table, TLB, ...).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Buffer {
    /// Identifier from the description.
    pub name: String,
    /// Address type this buffer is probed with.
    pub address_type: AddressTypeId,
    /// Number of sets (power of two).
    pub sets: usize,
    /// Associativity.
    pub ways: usize,
    /// Width of the line-offset field.
    pub line_bits: u32,
    /// Replacement policy.
    pub policy: ReplacementPolicy,
    /// Parent buffer, if any.
    pub parent: Option<BufferId>,
    /// View buffers mirror their parent and always forward probes to it.
    pub view: bool,
    /// Address decomposition.
    pub layout: FieldLayout,
}

impl Buffer {
    /// Set index of `addr`.
    #[inline]
    pub fn index(&self, addr: u64) -> usize {
        self.layout.index.extract(addr) as usize
    }

    /// Tag of `addr`.
    #[inline]
    pub fn tag(&self, addr: u64) -> u64 {
        self.layout.tag.extract(addr)
    }

    /// `addr` with its tag field replaced by `tag`.
    pub fn with_tag(&self, addr: u64, tag: u64) -> u64 {
        self.layout.tag.deposit(addr, tag)
    }
}
