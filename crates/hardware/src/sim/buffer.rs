//! Set-Associative Buffer Simulator.
//!
//! This module models the resident-line table of one associative buffer. A
//! probe computes the set index and tag of the address and then:
//! 1. **Hit:** a valid line with the same tag is resident; its recency is updated.
//! 2. **Miss:** the set still has a free way; the line is installed into the lowest one.
//! 3. **Replace:** the set is full; the policy picks a victim, which is evicted.

use super::access::{BufferAccessEvent, BufferProbe};
use super::policies::{self, ReplacementPolicy};
use crate::arch::{Buffer, BufferId, FieldLayout};

/// Resident line entry containing tag and validity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Line {
    tag: u64,
    valid: bool,
}

/// Simulator state for one buffer.
///
/// Cloning produces an independent snapshot, which is how rejected attempts
/// are rolled back.
#[derive(Clone, Debug)]
pub struct BufferSim {
    id: BufferId,
    layout: FieldLayout,
    lines: Vec<Line>,
    sets: usize,
    ways: usize,
    policy: Box<dyn ReplacementPolicy>,
}

impl BufferSim {
    /// Creates an empty simulator (all ways invalid) for a declared buffer.
    ///
    /// # Arguments
    ///
    /// * `id` - Arena handle of the buffer.
    /// * `buffer` - The validated buffer declaration.
    pub fn new(id: BufferId, buffer: &Buffer) -> Self {
        Self {
            id,
            layout: buffer.layout.clone(),
            lines: vec![Line::default(); buffer.sets * buffer.ways],
            sets: buffer.sets,
            ways: buffer.ways,
            policy: policies::build(buffer.policy, buffer.sets, buffer.ways),
        }
    }

    /// Handle of the simulated buffer.
    pub const fn id(&self) -> BufferId {
        self.id
    }

    /// Number of sets.
    pub const fn sets(&self) -> usize {
        self.sets
    }

    /// Associativity.
    pub const fn ways(&self) -> usize {
        self.ways
    }

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

    fn set(&self, index: usize) -> &[Line] {
        let base = index * self.ways;
        &self.lines[base..base + self.ways]
    }

    fn find(&self, index: usize, tag: u64) -> Option<usize> {
        self.set(index)
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    /// Returns `true` if the line holding `addr` is resident.
    pub fn resident(&self, addr: u64) -> bool {
        self.find(self.index(addr), self.tag(addr)).is_some()
    }

    /// Number of valid ways in set `index`.
    pub fn occupancy(&self, index: usize) -> usize {
        self.set(index).iter().filter(|line| line.valid).count()
    }

    /// Returns `true` when every way of set `index` is valid.
    pub fn is_set_full(&self, index: usize) -> bool {
        self.occupancy(index) == self.ways
    }

    /// Probes the buffer with `addr`, updating its state.
    ///
    /// # Arguments
    ///
    /// * `addr` - Address presented to this buffer.
    ///
    /// # Returns
    ///
    /// The probe record, including the evicted tag on a replacement.
    pub fn probe(&mut self, addr: u64) -> BufferProbe {
        let index = self.index(addr);
        let tag = self.tag(addr);
        let base = index * self.ways;

        let (way, event, evicted_tag) = if let Some(way) = self.find(index, tag) {
            self.policy.touch(index, way);
            (way, BufferAccessEvent::Hit, None)
        } else if let Some(way) = self.set(index).iter().position(|line| !line.valid) {
            self.lines[base + way] = Line { tag, valid: true };
            self.policy.fill(index, way);
            (way, BufferAccessEvent::Miss, None)
        } else {
            let way = self.policy.victim(index);
            let evicted = self.lines[base + way].tag;
            self.lines[base + way] = Line { tag, valid: true };
            self.policy.fill(index, way);
            (way, BufferAccessEvent::Replace, Some(evicted))
        };

        tracing::trace!(
            buffer = self.id.0,
            addr,
            index,
            tag,
            way,
            %event,
            "probe"
        );

        BufferProbe {
            buffer: self.id,
            address: addr,
            index,
            tag,
            way,
            event,
            evicted_tag,
        }
    }

    /// Invalidates every line and resets the replacement policy.
    pub fn reset(&mut self) {
        self.lines.fill(Line::default());
        self.policy.reset();
    }
}
