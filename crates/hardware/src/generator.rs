//! Lazy candidate-sequence generation.
//!
//! A [`Template`] lists, per position, the entry buffer, the admissible
//! addresses and optionally an outcome the position must produce. The
//! [`SequenceGenerator`] walks the cartesian product of the address choices one
//! combination at a time; each pull replays one combination on a fresh run,
//! invokes the goal-directed loader where a goal is not met naturally, and
//! reports the result. The consumer decides when to stop.

use std::sync::Arc;

use crate::arch::{ArchModel, BufferId};
use crate::common::Result;
use crate::config::GeneratorConfig;
use crate::filter::FilterPipeline;
use crate::hazard::MemoryUnitedHazard;
use crate::loader::{Goal, GoalReacher, Loader, Reach, alias_pool};
use crate::run::{Rejection, SequenceRun, Step};
use crate::sim::{BufferAccessEvent, MemoryAccess};
use crate::stats::SequenceStats;

/// One position of a template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Slot {
    /// Buffer the access enters through.
    pub entry: BufferId,
    /// Addresses this position may take.
    pub choices: Vec<u64>,
    /// Outcome the access must produce at a buffer, if any.
    pub goal: Option<(BufferId, BufferAccessEvent)>,
}

impl Slot {
    /// A position without a goal.
    pub fn new(entry: BufferId, choices: Vec<u64>) -> Self {
        Self {
            entry,
            choices,
            goal: None,
        }
    }

    /// Requires the access to produce `event` at `buffer`.
    #[must_use]
    pub fn with_goal(mut self, buffer: BufferId, event: BufferAccessEvent) -> Self {
        self.goal = Some((buffer, event));
        self
    }
}

/// Ordered list of slots.
pub type Template = Vec<Slot>;

/// Loads spliced into an accepted sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplicedLoader {
    /// Position of the first load in the accepted records.
    pub position: usize,
    /// The loader.
    pub loader: Loader,
}

/// A sequence that passed every filter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AcceptedSequence {
    /// Template addresses of this combination.
    pub addresses: Vec<u64>,
    /// Every access, loads included, in execution order.
    pub records: Vec<MemoryAccess>,
    /// United hazards of each record.
    pub hazards: Vec<Vec<MemoryUnitedHazard>>,
    /// Loaders used to reach the goals of this sequence.
    pub loaders: Vec<SplicedLoader>,
    /// Counters of the run that produced it.
    pub stats: SequenceStats,
}

/// Result of evaluating one combination.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Candidate {
    /// Every access was accepted and every goal was met.
    Accepted(AcceptedSequence),
    /// A filter rejected an access.
    Rejected {
        /// Template addresses of this combination.
        addresses: Vec<u64>,
        /// Which filter rejected what.
        rejection: Rejection,
    },
    /// A goal could not be reached.
    Unreachable {
        /// Template addresses of this combination.
        addresses: Vec<u64>,
        /// The goal.
        goal: Goal,
    },
}

impl Candidate {
    /// The accepted sequence, if any.
    pub const fn accepted(&self) -> Option<&AcceptedSequence> {
        match self {
            Self::Accepted(seq) => Some(seq),
            _ => None,
        }
    }
}

/// Pull-based producer of candidate sequences.
///
/// Finite: it yields one item per combination of the template's choices and
/// then stops. [`SequenceGenerator::restart`] starts over.
#[derive(Clone, Debug)]
pub struct SequenceGenerator {
    arch: Arc<ArchModel>,
    pipeline: FilterPipeline,
    config: GeneratorConfig,
    template: Template,
    odometer: Vec<usize>,
    done: bool,
}

impl SequenceGenerator {
    /// Creates a generator over `template`.
    pub fn new(
        arch: Arc<ArchModel>,
        pipeline: FilterPipeline,
        config: GeneratorConfig,
        template: Template,
    ) -> Self {
        let mut generator = Self {
            arch,
            pipeline,
            config,
            odometer: vec![0; template.len()],
            template,
            done: false,
        };
        generator.restart();
        generator
    }

    /// Rewinds to the first combination.
    pub fn restart(&mut self) {
        self.odometer.fill(0);
        self.done = self.template.iter().any(|slot| slot.choices.is_empty());
    }

    /// Number of combinations the template spans, saturating at `usize::MAX`.
    pub fn combinations(&self) -> usize {
        self.template
            .iter()
            .fold(1usize, |acc, slot| acc.saturating_mul(slot.choices.len()))
    }

    fn current(&self) -> Vec<u64> {
        self.template
            .iter()
            .zip(&self.odometer)
            .map(|(slot, &i)| slot.choices[i])
            .collect()
    }

    /// Advances the odometer; the last slot varies fastest.
    fn advance(&mut self) {
        for (digit, slot) in self.odometer.iter_mut().zip(&self.template).rev() {
            *digit += 1;
            if *digit < slot.choices.len() {
                return;
            }
            *digit = 0;
        }
        self.done = true;
    }

    /// Alias pool for a goal: drawn from the segment of the target, varying
    /// the tag of the goal buffer when it shares the entry's address type.
    fn pool_for(&self, entry: BufferId, goal: &Goal) -> Vec<u64> {
        let entry_type = self.arch.buffer(entry).address_type;
        let Some(segment) = self.arch.segment_containing(entry_type, goal.address) else {
            return Vec::new();
        };
        let layout = if self.arch.buffer(goal.buffer).address_type == entry_type {
            goal.buffer
        } else {
            entry
        };
        alias_pool(
            &self.arch,
            layout,
            goal.address,
            segment,
            self.config.alias_pool_size,
        )
    }

    /// Replays one combination on a fresh run.
    ///
    /// `addresses` holds one address per slot; slots without an address are
    /// not replayed.
    ///
    /// # Errors
    ///
    /// Addressing errors and filter defects of this combination.
    pub fn evaluate(&self, addresses: Vec<u64>) -> Result<Candidate> {
        let reacher = GoalReacher::new(self.config);
        let mut run = SequenceRun::new(Arc::clone(&self.arch), self.pipeline.clone());
        let mut loaders = Vec::new();

        for (i, slot) in self.template.iter().enumerate() {
            let Some(&addr) = addresses.get(i) else {
                break;
            };
            if let Some((buffer, event)) = slot.goal {
                let natural = run.peek(slot.entry, addr)?;
                let met = matches!(
                    &natural,
                    Step::Accepted(access)
                        if access.event(buffer).is_some_and(|e| e.satisfies(event))
                );

                if !met {
                    let goal = Goal {
                        buffer,
                        event,
                        address: addr,
                    };
                    let pool = self.pool_for(slot.entry, &goal);
                    let loader = match reacher.reach(&run, slot.entry, goal, &pool)? {
                        Reach::Reached(loader) => loader,
                        Reach::Unreachable { goal, .. } => {
                            return Ok(Candidate::Unreachable { addresses, goal });
                        }
                    };

                    let position = run.len();
                    for &load in &loader.loads {
                        if let Step::Rejected(rejection) = run.step(slot.entry, load)? {
                            return Ok(Candidate::Rejected {
                                addresses,
                                rejection,
                            });
                        }
                    }
                    loaders.push(SplicedLoader { position, loader });
                }
            }

            if let Step::Rejected(rejection) = run.step(slot.entry, addr)? {
                return Ok(Candidate::Rejected {
                    addresses,
                    rejection,
                });
            }
        }

        Ok(Candidate::Accepted(AcceptedSequence {
            addresses,
            records: run.history().to_vec(),
            hazards: run.hazards().to_vec(),
            loaders,
            stats: run.stats().clone(),
        }))
    }
}

impl Iterator for SequenceGenerator {
    type Item = Result<Candidate>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let addresses = self.current();
        self.advance();

        let candidate = self.evaluate(addresses);
        match &candidate {
            Ok(Candidate::Accepted(seq)) => {
                tracing::debug!(records = seq.records.len(), "candidate accepted");
            }
            Ok(Candidate::Rejected { rejection, .. }) => {
                tracing::debug!(
                    filter = rejection.filter,
                    position = rejection.position,
                    "candidate rejected"
                );
            }
            Ok(Candidate::Unreachable { goal, .. }) => {
                tracing::debug!(buffer = goal.buffer.0, event = %goal.event, "candidate goal unreachable");
            }
            Err(e) => tracing::debug!(error = %e, "candidate failed"),
        }
        Some(candidate)
    }
}
