//! Sequence statistics collection and reporting.
//!
//! This module tracks what a generation run observed. It provides:
//! 1. **Buffer events:** Hit, miss and replacement counts per buffer.
//! 2. **Hazards:** Relation counts by hazard type.
//! 3. **Rejections:** Rejected accesses by filter name.

use std::collections::BTreeMap;
use std::fmt;

use crate::arch::BufferId;
use crate::hazard::{HazardType, MemoryUnitedHazard};
use crate::sim::{BufferAccessEvent, MemoryAccess};

/// Event counts of one buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferStats {
    /// Probes that hit.
    pub hits: u64,
    /// Probes that filled a free way.
    pub misses: u64,
    /// Probes that evicted a resident line.
    pub replaces: u64,
}

impl BufferStats {
    /// Total probes.
    pub const fn probes(&self) -> u64 {
        self.hits + self.misses + self.replaces
    }
}

/// Counters for one run. Only committed (accepted) accesses are counted as events.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SequenceStats {
    /// Accepted accesses.
    pub accesses: u64,
    /// Event counts per buffer.
    pub buffers: BTreeMap<BufferId, BufferStats>,
    /// Relation counts per hazard type.
    pub hazards: BTreeMap<HazardType, u64>,
    /// Rejected accesses per filter name.
    pub rejections: BTreeMap<&'static str, u64>,
}

impl SequenceStats {
    /// Counts the events of an accepted access.
    pub fn record_access(&mut self, access: &MemoryAccess) {
        self.accesses += 1;
        for probe in &access.probes {
            let entry = self.buffers.entry(probe.buffer).or_default();
            match probe.event {
                BufferAccessEvent::Hit => entry.hits += 1,
                BufferAccessEvent::Miss => entry.misses += 1,
                BufferAccessEvent::Replace => entry.replaces += 1,
            }
        }
    }

    /// Counts the relations of an accepted access.
    pub fn record_hazards(&mut self, hazards: &[MemoryUnitedHazard]) {
        for united in hazards {
            for kind in HazardType::ALL {
                let n = united.count(kind) as u64;
                if n > 0 {
                    *self.hazards.entry(kind).or_default() += n;
                }
            }
        }
    }

    /// Counts one rejection.
    pub fn record_rejection(&mut self, filter: &'static str) {
        *self.rejections.entry(filter).or_default() += 1;
    }

    /// Hit rate of `buffer` in `[0, 1]`, or `None` if it was never probed.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self, buffer: BufferId) -> Option<f64> {
        let stats = self.buffers.get(&buffer)?;
        let probes = stats.probes();
        (probes > 0).then(|| stats.hits as f64 / probes as f64)
    }

    /// Total rejections.
    pub fn total_rejections(&self) -> u64 {
        self.rejections.values().sum()
    }
}

impl fmt::Display for SequenceStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "accesses: {}", self.accesses)?;
        for (id, s) in &self.buffers {
            writeln!(
                f,
                "  buffer {:<3} hit {:>6}  miss {:>6}  replace {:>6}",
                id.0, s.hits, s.misses, s.replaces
            )?;
        }
        for (kind, n) in &self.hazards {
            writeln!(f, "  {kind:<13} {n:>6}")?;
        }
        for (filter, n) in &self.rejections {
            writeln!(f, "  rejected by {filter}: {n}")?;
        }
        Ok(())
    }
}
