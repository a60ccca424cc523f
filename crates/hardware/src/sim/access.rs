//! Probe outcomes and per-access records.

use std::fmt;

use crate::arch::BufferId;

/// Observable outcome of probing one buffer with one address.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BufferAccessEvent {
    /// The line was resident.
    Hit,
    /// The line was absent and installed into a free way.
    Miss,
    /// The line was absent and installed by evicting a resident line.
    Replace,
}

impl BufferAccessEvent {
    /// Every event, in declaration order.
    pub const ALL: [Self; 3] = [Self::Hit, Self::Miss, Self::Replace];

    /// Returns `true` for [`BufferAccessEvent::Hit`].
    #[inline]
    pub const fn is_hit(self) -> bool {
        matches!(self, Self::Hit)
    }

    /// Returns `true` for misses, including replacements.
    #[inline]
    pub const fn is_miss(self) -> bool {
        !self.is_hit()
    }

    /// Returns `true` if observing `self` fulfils a goal asking for `goal`.
    ///
    /// A replacement is a miss, so it satisfies a `Miss` goal; the converse
    /// does not hold.
    pub const fn satisfies(self, goal: Self) -> bool {
        match goal {
            Self::Hit => matches!(self, Self::Hit),
            Self::Miss => self.is_miss(),
            Self::Replace => matches!(self, Self::Replace),
        }
    }
}

impl fmt::Display for BufferAccessEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Replace => write!(f, "REPLACE"),
        }
    }
}

/// Result of probing a single buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BufferProbe {
    /// Buffer that was probed.
    pub buffer: BufferId,
    /// Address presented to the buffer (after any segment translation).
    pub address: u64,
    /// Set index of `address`.
    pub index: usize,
    /// Tag of `address`.
    pub tag: u64,
    /// Way that holds the line after the probe.
    pub way: usize,
    /// Outcome.
    pub event: BufferAccessEvent,
    /// Tag evicted by a [`BufferAccessEvent::Replace`].
    pub evicted_tag: Option<u64>,
}

/// One simulated access through the buffer hierarchy.
///
/// `probes` lists every buffer touched, in touch order (child before parent).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MemoryAccess {
    /// Address issued to the entry buffer.
    pub address: u64,
    /// Buffer the access entered the hierarchy through.
    pub entry: BufferId,
    /// Per-buffer outcomes.
    pub probes: Vec<BufferProbe>,
}

impl MemoryAccess {
    /// Probe record for `buffer`, if the access touched it.
    pub fn probe(&self, buffer: BufferId) -> Option<&BufferProbe> {
        self.probes.iter().find(|p| p.buffer == buffer)
    }

    /// Event observed at `buffer`, if the access touched it.
    pub fn event(&self, buffer: BufferId) -> Option<BufferAccessEvent> {
        self.probe(buffer).map(|p| p.event)
    }

    /// Returns `true` if the access touched `buffer`.
    pub fn touched(&self, buffer: BufferId) -> bool {
        self.probe(buffer).is_some()
    }
}
