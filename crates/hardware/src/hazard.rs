//! Memory Hazard Analysis.
//!
//! This module relates the current access to every earlier access of the
//! sequence that probed the same buffer. It provides:
//! 1. **Hazard Types:** A closed enumeration of the relations that constrain joint outcomes.
//! 2. **Pairwise Hazards:** `MemoryHazard`, one relation between two sequence positions.
//! 3. **Aggregation:** `MemoryUnitedHazard`, every relation of the current access for one buffer.
//!
//! Earlier accesses are visited in sequence order and each bucket preserves that
//! order, so the same sequence always yields identical hazard sets.

use std::collections::BTreeMap;
use std::fmt;

use crate::arch::BufferId;
use crate::sim::{BufferProbe, MemoryAccess};

/// Kind of relation between two probes of the same buffer and set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HazardType {
    /// Both probes used the identical address. Symmetric.
    AddrEqual,
    /// Same set, different tags: the probes contend for the set. Symmetric.
    IndexEqual,
    /// Same set and tag. Symmetric.
    TagEqual,
    /// The earlier access evicted the tag the current one finds absent and
    /// installs again. Antisymmetric (earlier evicted, current re-installed).
    TagReplaced,
}

impl HazardType {
    /// Every hazard type, in bucket order.
    pub const ALL: [Self; 4] = [
        Self::AddrEqual,
        Self::IndexEqual,
        Self::TagEqual,
        Self::TagReplaced,
    ];

    /// Returns `true` if swapping the pair yields the same relation.
    pub const fn is_symmetric(self) -> bool {
        !matches!(self, Self::TagReplaced)
    }
}

impl fmt::Display for HazardType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::AddrEqual => "ADDR_EQUAL",
            Self::IndexEqual => "INDEX_EQUAL",
            Self::TagEqual => "TAG_EQUAL",
            Self::TagReplaced => "TAG_REPLACED",
        };
        f.pad(name)
    }
}

/// A typed relation between two positions of the sequence.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MemoryHazard {
    /// Relation kind.
    pub kind: HazardType,
    /// Buffer both probes touched.
    pub buffer: BufferId,
    /// Sequence position of the earlier access.
    pub earlier: usize,
    /// Sequence position of the current access.
    pub current: usize,
}

/// Every hazard between the current access and earlier ones, for one buffer.
///
/// Built once by [`HazardAnalyzer::analyze`] and only read afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryUnitedHazard {
    buffer: BufferId,
    position: usize,
    relations: BTreeMap<HazardType, Vec<MemoryHazard>>,
}

impl MemoryUnitedHazard {
    /// Groups `hazards` by type, keeping their order within each bucket.
    pub fn new(buffer: BufferId, position: usize, hazards: Vec<MemoryHazard>) -> Self {
        let mut relations: BTreeMap<HazardType, Vec<MemoryHazard>> = BTreeMap::new();
        for hazard in hazards {
            relations.entry(hazard.kind).or_default().push(hazard);
        }
        Self {
            buffer,
            position,
            relations,
        }
    }

    /// Buffer the relations belong to.
    pub const fn buffer(&self) -> BufferId {
        self.buffer
    }

    /// Sequence position of the current access.
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Relations of one type, in sequence order of the earlier access.
    pub fn relations(&self, kind: HazardType) -> &[MemoryHazard] {
        self.relations.get(&kind).map_or(&[], Vec::as_slice)
    }

    /// Number of relations of one type.
    pub fn count(&self, kind: HazardType) -> usize {
        self.relations(kind).len()
    }

    /// Returns `true` if at least one relation of `kind` exists.
    pub fn has(&self, kind: HazardType) -> bool {
        self.count(kind) > 0
    }

    /// Returns `true` when the access is unrelated to every earlier one.
    pub fn is_empty(&self) -> bool {
        self.relations.is_empty()
    }

    /// All relations, grouped by type in [`HazardType`] order.
    pub fn iter(&self) -> impl Iterator<Item = &MemoryHazard> + '_ {
        self.relations.values().flatten()
    }

    /// Total number of relations.
    pub fn len(&self) -> usize {
        self.relations.values().map(Vec::len).sum()
    }
}

/// Computes hazards of an access against the sequence history.
#[derive(Clone, Copy, Debug, Default)]
pub struct HazardAnalyzer;

impl HazardAnalyzer {
    /// Classifies the relation between an earlier and a current probe.
    ///
    /// Probes of different sets are unrelated. Same-set probes yield exactly
    /// one of `IndexEqual`, `TagEqual` or `TagReplaced`, plus `AddrEqual` when
    /// the addresses are identical.
    pub fn classify(earlier: &BufferProbe, current: &BufferProbe) -> Vec<HazardType> {
        if earlier.buffer != current.buffer || earlier.index != current.index {
            return Vec::new();
        }

        let mut kinds = Vec::with_capacity(2);
        if earlier.address == current.address {
            kinds.push(HazardType::AddrEqual);
        }
        if earlier.tag == current.tag {
            kinds.push(HazardType::TagEqual);
        } else if current.event.is_miss() && earlier.evicted_tag == Some(current.tag) {
            kinds.push(HazardType::TagReplaced);
        } else {
            kinds.push(HazardType::IndexEqual);
        }
        kinds
    }

    /// Builds the united hazard of `current` for every buffer it touched.
    ///
    /// # Arguments
    ///
    /// * `history` - Earlier accesses; the position of an access is its index.
    /// * `current` - The new access, at position `history.len()`.
    ///
    /// # Returns
    ///
    /// One [`MemoryUnitedHazard`] per touched buffer, in touch order.
    pub fn analyze(history: &[MemoryAccess], current: &MemoryAccess) -> Vec<MemoryUnitedHazard> {
        let position = history.len();

        current
            .probes
            .iter()
            .map(|probe| {
                let hazards = history
                    .iter()
                    .enumerate()
                    .filter_map(|(pos, earlier)| Some((pos, earlier.probe(probe.buffer)?)))
                    .flat_map(|(pos, earlier)| {
                        Self::classify(earlier, probe)
                            .into_iter()
                            .map(move |kind| MemoryHazard {
                                kind,
                                buffer: probe.buffer,
                                earlier: pos,
                                current: position,
                            })
                    })
                    .collect();
                MemoryUnitedHazard::new(probe.buffer, position, hazards)
            })
            .collect()
    }
}
