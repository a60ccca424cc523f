//! Replacement Policies.
//!
//! Implements deterministic algorithms for selecting victim ways in
//! set-associative buffers. Determinism matters here: the hazard analyzer and
//! the goal-directed loader rely on re-running a sequence and getting the same
//! events.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out.
//! - `Lru`: Least Recently Used.
//! - `Mru`: Most Recently Used.
//! - `Plru`: Pseudo-LRU (bit-vector).

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Most Recently Used replacement policy.
pub mod mru;

/// Pseudo-LRU replacement policy.
pub mod plru;

use std::fmt::Debug;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use mru::MruPolicy;
pub use plru::PlruPolicy;

use crate::config::ReplacementPolicy as PolicyType;

/// Trait for buffer replacement policies.
///
/// Defines the interface for updating recency state and selecting victim ways.
/// Policies are only asked for a victim when every way of the set is valid.
pub trait ReplacementPolicy: Send + Sync + Debug {
    /// Updates the policy state when a resident way is hit.
    ///
    /// # Arguments
    ///
    /// * `set` - The set index.
    /// * `way` - The way that was accessed.
    fn touch(&mut self, set: usize, way: usize);

    /// Updates the policy state when a line is installed into `way`.
    ///
    /// Defaults to [`ReplacementPolicy::touch`].
    fn fill(&mut self, set: usize, way: usize) {
        self.touch(set, way);
    }

    /// Selects the way to evict from a full set.
    fn victim(&self, set: usize) -> usize;

    /// Returns the policy to its initial state.
    fn reset(&mut self);

    /// Clones the policy behind a fresh box.
    fn clone_box(&self) -> Box<dyn ReplacementPolicy>;
}

impl Clone for Box<dyn ReplacementPolicy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Instantiates the policy named by the architecture description.
///
/// # Arguments
///
/// * `kind` - Policy selected in the description.
/// * `sets` - Number of sets in the buffer.
/// * `ways` - Associativity of the buffer.
pub fn build(kind: PolicyType, sets: usize, ways: usize) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyType::Plru => Box::new(PlruPolicy::new(sets, ways)),
        PolicyType::Fifo => Box::new(FifoPolicy::new(sets, ways)),
        PolicyType::Mru => Box::new(MruPolicy::new(sets, ways)),
    }
}
