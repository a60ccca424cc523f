//! Sequence run.
//!
//! A `SequenceRun` is the state of one generation run: the private simulator
//! state, the accepted history, and the hazards computed for each step. Every
//! step is attempted on a snapshot and committed only when the filter pipeline
//! accepts it, so a rejected or failed step leaves the run untouched.

use std::sync::Arc;

use crate::arch::{ArchModel, BufferId};
use crate::common::Result;
use crate::filter::{FilterPipeline, Verdict};
use crate::hazard::{HazardAnalyzer, MemoryUnitedHazard};
use crate::sim::{MemoryAccess, MemorySystem};
use crate::stats::SequenceStats;

/// A rejected step, reported for diagnostics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Rejection {
    /// Position the rejected access would have taken.
    pub position: usize,
    /// Name of the rejecting filter.
    pub filter: &'static str,
    /// Buffer whose hazards were rejected.
    pub buffer: BufferId,
    /// The access as it would have been recorded.
    pub access: MemoryAccess,
}

/// Outcome of one step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The access was committed to the history.
    Accepted(MemoryAccess),
    /// A filter rejected the access; nothing was committed.
    Rejected(Rejection),
}

impl Step {
    /// Returns `true` for [`Step::Accepted`].
    pub const fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }
}

/// State of one generation run.
///
/// Cloning yields an independent snapshot sharing the model and filters.
#[derive(Clone, Debug)]
pub struct SequenceRun {
    memory: MemorySystem,
    pipeline: FilterPipeline,
    history: Vec<MemoryAccess>,
    hazards: Vec<Vec<MemoryUnitedHazard>>,
    stats: SequenceStats,
}

impl SequenceRun {
    /// Starts a run with every buffer empty.
    pub fn new(arch: Arc<ArchModel>, pipeline: FilterPipeline) -> Self {
        Self {
            memory: MemorySystem::new(arch),
            pipeline,
            history: Vec::new(),
            hazards: Vec::new(),
            stats: SequenceStats::default(),
        }
    }

    /// The shared architecture model.
    pub fn arch(&self) -> &Arc<ArchModel> {
        self.memory.arch()
    }

    /// Current simulator state.
    pub fn memory(&self) -> &MemorySystem {
        &self.memory
    }

    /// The filter pipeline.
    pub fn pipeline(&self) -> &FilterPipeline {
        &self.pipeline
    }

    /// Accepted accesses, in sequence order.
    pub fn history(&self) -> &[MemoryAccess] {
        &self.history
    }

    /// United hazards of each accepted access, by position.
    pub fn hazards(&self) -> &[Vec<MemoryUnitedHazard>] {
        &self.hazards
    }

    /// Counters for this run.
    pub fn stats(&self) -> &SequenceStats {
        &self.stats
    }

    /// Number of accepted accesses.
    pub fn len(&self) -> usize {
        self.history.len()
    }

    /// Returns `true` before the first accepted access.
    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Simulates, analyzes and filters one access without committing it.
    ///
    /// Returns the snapshot the access produced together with its hazards and
    /// the pipeline verdict.
    fn attempt(
        &self,
        entry: BufferId,
        addr: u64,
    ) -> Result<(MemorySystem, MemoryAccess, Vec<MemoryUnitedHazard>, Verdict)> {
        let mut memory = self.memory.clone();
        let access = memory.access(entry, addr)?;
        let hazards = HazardAnalyzer::analyze(&self.history, &access);
        let verdict = self
            .pipeline
            .check(self.memory.arch(), &access, &hazards)?;
        Ok((memory, access, hazards, verdict))
    }

    /// Extends the sequence with one access entering at `entry`.
    ///
    /// # Errors
    ///
    /// [`Error::AddressNotMapped`](crate::common::Error::AddressNotMapped) for
    /// an unmapped address and
    /// [`Error::FilterDefect`](crate::common::Error::FilterDefect) for a failing
    /// filter. In both cases the run is unchanged.
    pub fn step(&mut self, entry: BufferId, addr: u64) -> Result<Step> {
        let (memory, access, hazards, verdict) = self.attempt(entry, addr)?;
        match verdict {
            Verdict::Accepted => {
                self.memory = memory;
                self.stats.record_access(&access);
                self.stats.record_hazards(&hazards);
                self.history.push(access.clone());
                self.hazards.push(hazards);
                Ok(Step::Accepted(access))
            }
            Verdict::Rejected { filter, buffer } => {
                self.stats.record_rejection(filter);
                Ok(Step::Rejected(Rejection {
                    position: self.history.len(),
                    filter,
                    buffer,
                    access,
                }))
            }
        }
    }

    /// Simulates one access on a snapshot and reports what would happen.
    ///
    /// The run is not modified.
    ///
    /// # Errors
    ///
    /// As for [`SequenceRun::step`].
    pub fn peek(&self, entry: BufferId, addr: u64) -> Result<Step> {
        let mut probe = self.clone();
        probe.step(entry, addr)
    }

    /// Clears history and simulator state.
    pub fn reset(&mut self) {
        self.memory.reset();
        self.history.clear();
        self.hazards.clear();
        self.stats = SequenceStats::default();
    }
}
