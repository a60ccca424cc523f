//! Buffer simulation.
//!
//! This module turns the immutable [`ArchModel`] into mutable simulator state.
//! It provides:
//! 1. **Buffer Simulator:** Per-buffer resident-line tables with deterministic replacement.
//! 2. **Memory System:** An arena of simulators, one per declared buffer, probed as a hierarchy.
//! 3. **Access Records:** Per-access, per-buffer events in touch order.
//!
//! A hierarchical access probes the entry buffer first. A regular child
//! forwards to its parent only on a miss; a view always forwards, because its
//! contents mirror the parent's and the parent must be consulted to keep the
//! two consistent.

/// Probe outcomes and per-access records.
pub mod access;

/// Single-buffer simulator.
pub mod buffer;

/// Replacement policies.
pub mod policies;

use std::sync::Arc;

pub use access::{BufferAccessEvent, BufferProbe, MemoryAccess};
pub use buffer::BufferSim;

use crate::arch::{ArchModel, BufferId};
use crate::common::{Error, Result};

/// Simulator state of every buffer of one architecture.
///
/// Owned by exactly one generation run. Cloning yields an independent snapshot;
/// the architecture itself is shared.
#[derive(Clone, Debug)]
pub struct MemorySystem {
    arch: Arc<ArchModel>,
    sims: Vec<BufferSim>,
}

impl MemorySystem {
    /// Creates one empty simulator per declared buffer.
    pub fn new(arch: Arc<ArchModel>) -> Self {
        let sims = arch
            .buffers()
            .iter()
            .enumerate()
            .map(|(i, b)| BufferSim::new(BufferId(i), b))
            .collect();
        Self { arch, sims }
    }

    /// The shared architecture model.
    pub fn arch(&self) -> &Arc<ArchModel> {
        &self.arch
    }

    /// Simulator of buffer `id`.
    pub fn sim(&self, id: BufferId) -> &BufferSim {
        &self.sims[id.0]
    }

    /// Resolves the address every buffer on the path from `entry` would see.
    ///
    /// Addresses cross into a parent unchanged when both share an address
    /// type, and through the containing segment's translation otherwise.
    ///
    /// # Errors
    ///
    /// [`Error::AddressNotMapped`] if `addr` (or its translation) falls outside
    /// every segment of the corresponding buffer's address type.
    pub fn route(&self, entry: BufferId, addr: u64) -> Result<Vec<(BufferId, u64)>> {
        let path = self.arch.path(entry);
        let mut route = Vec::with_capacity(path.len());
        let mut current = addr;
        let mut current_type = self.arch.buffer(entry).address_type;

        for id in path {
            let buffer = self.arch.buffer(id);
            let unmapped = || Error::AddressNotMapped {
                buffer: buffer.name.clone(),
                address: current,
            };

            if buffer.address_type != current_type {
                let (target, translated) = self
                    .arch
                    .segments_of(current_type)
                    .filter(|s| s.contains(current))
                    .find_map(|s| s.translate(current).filter(|(t, _)| *t == buffer.address_type))
                    .ok_or_else(unmapped)?;
                current = translated;
                current_type = target;
            }
            if self.arch.segment_containing(current_type, current).is_none() {
                return Err(Error::AddressNotMapped {
                    buffer: buffer.name.clone(),
                    address: current,
                });
            }
            route.push((id, current));
        }
        Ok(route)
    }

    /// Performs one access entering the hierarchy at `entry`.
    ///
    /// The whole route is validated before any buffer is mutated, so an
    /// unmapped address leaves the state untouched.
    ///
    /// # Errors
    ///
    /// [`Error::AddressNotMapped`] as described in [`MemorySystem::route`].
    pub fn access(&mut self, entry: BufferId, addr: u64) -> Result<MemoryAccess> {
        let route = self.route(entry, addr)?;
        let mut probes = Vec::with_capacity(route.len());

        for (id, address) in route {
            let probe = self.sims[id.0].probe(address);
            probes.push(probe);
            let forward = self.arch.buffer(id).view || probe.event.is_miss();
            if !forward {
                break;
            }
        }

        Ok(MemoryAccess {
            address: addr,
            entry,
            probes,
        })
    }

    /// Returns `true` if the line holding `addr` is resident in buffer `id`.
    pub fn resident(&self, id: BufferId, addr: u64) -> bool {
        self.sims[id.0].resident(addr)
    }

    /// Invalidates every buffer.
    pub fn reset(&mut self) {
        for sim in &mut self.sims {
            sim.reset();
        }
    }
}
