//! Goal-Directed Loader.
//!
//! Given a run prefix and a goal `(buffer, event, address)`, the loader
//! synthesizes the accesses ("loads") that must run immediately before the
//! target probe so that the probe produces the wanted event. It provides:
//! 1. **Alias Pools:** Addresses of a segment that share the target's set but not its tag.
//! 2. **Goal Search:** A bounded, simulation-driven greedy search with alias rotation.
//!
//! Every load is executed through [`SequenceRun::step`] on a snapshot, so the
//! simulator, hazard analyzer and filter pipeline validate it exactly like a
//! template access, including the parent probes it induces. The caller's run is
//! never modified.

use std::collections::HashSet;

use crate::arch::{ArchModel, BufferId, Segment};
use crate::common::Result;
use crate::config::GeneratorConfig;
use crate::run::{SequenceRun, Step};
use crate::sim::{BufferAccessEvent, MemorySystem};

/// A desired outcome of one probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Goal {
    /// Buffer the event must be observed at.
    pub buffer: BufferId,
    /// Wanted event.
    pub event: BufferAccessEvent,
    /// Address of the target probe (as issued to the entry buffer).
    pub address: u64,
}

/// A reached goal and the loads that realize it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Loader {
    /// The goal.
    pub goal: Goal,
    /// Buffer the loads and the target probe enter through.
    pub entry: BufferId,
    /// Addresses to access, in order, right before the target probe.
    pub loads: Vec<u64>,
}

/// Result of a goal search.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reach {
    /// The goal is reachable with the given loads.
    Reached(Loader),
    /// No admissible alias combination reached the goal.
    Unreachable {
        /// The goal.
        goal: Goal,
        /// Number of attempts made.
        attempts: usize,
    },
}

impl Reach {
    /// The loader, if the goal was reached.
    pub const fn loader(&self) -> Option<&Loader> {
        match self {
            Self::Reached(loader) => Some(loader),
            Self::Unreachable { .. } => None,
        }
    }
}

/// Builds a pool of addresses aliasing `target` in `buffer`.
///
/// Every address keeps the target's offset and index bits, carries a distinct
/// tag different from the target's, and lies inside `segment`. Tags are taken
/// in ascending order starting from the tag of the segment start.
///
/// # Arguments
///
/// * `arch` - The architecture model.
/// * `buffer` - Buffer whose tag field is varied.
/// * `target` - The target address.
/// * `segment` - Segment the aliases must stay within.
/// * `count` - Maximum pool size.
pub fn alias_pool(
    arch: &ArchModel,
    buffer: BufferId,
    target: u64,
    segment: &Segment,
    count: usize,
) -> Vec<u64> {
    let buffer = arch.buffer(buffer);
    if segment.address_type != buffer.address_type {
        return Vec::new();
    }

    let target_tag = buffer.tag(target);
    let first = buffer.tag(segment.start);
    let last = buffer.tag(segment.end);

    let mut pool = Vec::with_capacity(count);
    let mut tag = first;
    while tag <= last && pool.len() < count {
        let candidate = buffer.with_tag(target, tag);
        if tag != target_tag && segment.contains(candidate) {
            pool.push(candidate);
        }
        let Some(next) = tag.checked_add(1) else {
            break;
        };
        tag = next;
    }
    pool
}

/// Addresses one access presents on its way to the goal buffer.
#[derive(Clone, Debug)]
struct Alias {
    /// Address issued at the entry buffer.
    entry_addr: u64,
    /// Address the goal buffer sees.
    goal_addr: u64,
    /// Non-view buffers probed before the goal buffer, with the address each
    /// sees. A hit in any of them stops the access short of the goal buffer.
    shadow: Vec<(BufferId, u64)>,
}

impl Alias {
    /// Splits `route` at `goal`. Returns `None` if `goal` is not on it.
    fn along(
        arch: &ArchModel,
        entry_addr: u64,
        route: &[(BufferId, u64)],
        goal: BufferId,
    ) -> Option<Self> {
        let at = route.iter().position(|&(id, _)| id == goal)?;
        let shadow = route[..at]
            .iter()
            .copied()
            .filter(|&(id, _)| !arch.buffer(id).view)
            .collect();
        Some(Self {
            entry_addr,
            goal_addr: route[at].1,
            shadow,
        })
    }

    /// Returns `true` if the access would hit before reaching the goal buffer.
    fn shadowed(&self, memory: &MemorySystem) -> bool {
        self.shadow.iter().any(|&(id, addr)| memory.resident(id, addr))
    }
}

/// Bounded search for the loads that realize a goal.
#[derive(Clone, Copy, Debug, Default)]
pub struct GoalReacher {
    config: GeneratorConfig,
}

impl GoalReacher {
    /// Creates a reacher with the given search bounds.
    pub const fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    /// Searches for loads that make the target probe produce `goal.event`.
    ///
    /// # Arguments
    ///
    /// * `run` - The sequence prefix; read only.
    /// * `entry` - Buffer the loads and the target probe enter through.
    /// * `goal` - The wanted outcome.
    /// * `pool` - Candidate alias addresses (entry-side).
    ///
    /// # Errors
    ///
    /// [`Error::AddressNotMapped`](crate::common::Error::AddressNotMapped) when
    /// the target itself is unmapped, and filter defects. An unreachable goal is
    /// not an error.
    pub fn reach(
        &self,
        run: &SequenceRun,
        entry: BufferId,
        goal: Goal,
        pool: &[u64],
    ) -> Result<Reach> {
        let route = run.memory().route(entry, goal.address)?;
        let Some(target) = Alias::along(run.arch(), goal.address, &route, goal.buffer) else {
            tracing::warn!(
                goal_buffer = goal.buffer.0,
                entry = entry.0,
                "goal buffer is not on the access path"
            );
            return Ok(Reach::Unreachable { goal, attempts: 0 });
        };

        let aliases = Self::admissible(run, entry, goal.buffer, target.goal_addr, pool);
        let attempts = self.config.max_goal_attempts.min(aliases.len().max(1));

        for attempt in 0..attempts {
            let mut rotated = aliases.clone();
            let shift = attempt.min(rotated.len());
            rotated.rotate_left(shift);
            tracing::debug!(attempt, aliases = rotated.len(), event = %goal.event, "goal attempt");

            if let Some(loads) = self.attempt(run, entry, goal, &target, &rotated)? {
                tracing::debug!(attempt, loads = loads.len(), "goal reached");
                return Ok(Reach::Reached(Loader { goal, entry, loads }));
            }
        }

        tracing::warn!(
            buffer = goal.buffer.0,
            address = goal.address,
            event = %goal.event,
            attempts,
            "goal unreachable"
        );
        Ok(Reach::Unreachable { goal, attempts })
    }

    /// Filters `pool` down to mapped addresses that share the target's set in
    /// the goal buffer, differ from its tag, and carry pairwise distinct tags.
    fn admissible(
        run: &SequenceRun,
        entry: BufferId,
        buffer: BufferId,
        target: u64,
        pool: &[u64],
    ) -> Vec<Alias> {
        let sim = run.memory().sim(buffer);
        let index = sim.index(target);
        let target_tag = sim.tag(target);
        let mut seen = HashSet::new();

        pool.iter()
            .filter_map(|&addr| {
                let route = run.memory().route(entry, addr).ok()?;
                let alias = Alias::along(run.arch(), addr, &route, buffer)?;
                let tag = sim.tag(alias.goal_addr);
                let admissible =
                    sim.index(alias.goal_addr) == index && tag != target_tag && seen.insert(tag);
                admissible.then_some(alias)
            })
            .collect()
    }

    /// One greedy attempt over `aliases` in the given order.
    ///
    /// Loads first bring the goal buffer into the wanted state. While the
    /// target would still hit in a buffer below the goal, further aliases that
    /// miss there are loaded to evict it.
    fn attempt(
        &self,
        run: &SequenceRun,
        entry: BufferId,
        goal: Goal,
        target: &Alias,
        aliases: &[Alias],
    ) -> Result<Option<Vec<u64>>> {
        let mut snapshot = run.clone();
        let mut loads = Vec::new();
        let mut pool = aliases.iter();
        let mut target_loaded = false;

        loop {
            let sim = snapshot.memory().sim(goal.buffer);
            let resident = sim.resident(target.goal_addr);
            let in_state = match goal.event {
                BufferAccessEvent::Hit => resident,
                BufferAccessEvent::Miss => !resident,
                BufferAccessEvent::Replace => {
                    !resident && sim.is_set_full(sim.index(target.goal_addr))
                }
            };
            let shadowed = target.shadowed(snapshot.memory());

            if in_state && !shadowed {
                return Ok(match snapshot.peek(entry, goal.address)? {
                    Step::Accepted(access)
                        if access
                            .event(goal.buffer)
                            .is_some_and(|e| e.satisfies(goal.event)) =>
                    {
                        Some(loads)
                    }
                    _ => None,
                });
            }
            if loads.len() >= self.config.max_loads_per_goal {
                return Ok(None);
            }

            let next = if in_state {
                let memory = snapshot.memory();
                let Some(alias) = pool.find(|a| !a.shadowed(memory)) else {
                    return Ok(None);
                };
                alias.entry_addr
            } else if goal.event == BufferAccessEvent::Hit {
                if target_loaded {
                    // The target was loaded once and still is not resident.
                    return Ok(None);
                }
                target_loaded = true;
                goal.address
            } else {
                let memory = snapshot.memory();
                let Some(alias) = pool.find(|a| !memory.resident(goal.buffer, a.goal_addr)) else {
                    return Ok(None);
                };
                alias.entry_addr
            };

            match snapshot.step(entry, next)? {
                Step::Accepted(_) => loads.push(next),
                Step::Rejected(rejection) => {
                    tracing::debug!(
                        load = next,
                        filter = rejection.filter,
                        "load rejected, trying next alias"
                    );
                    if next == goal.address {
                        return Ok(None);
                    }
                }
            }
        }
    }
}
