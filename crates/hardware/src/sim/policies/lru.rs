//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the way that has not been accessed for the longest time.
//! It maintains a usage stack for each set. When a way is accessed, it is moved
//! to the top (Most Recently Used position). The bottom of the stack represents
//! the Least Recently Used way.
//!
//! The initial stack is `[0, 1, .., ways - 1]`, so among ways that were never
//! touched the lowest index is the most recent. Because the simulator fills
//! free ways before asking for a victim, every way of a full set has been
//! touched at least once and the order is fully determined by the sequence.

use super::ReplacementPolicy;

/// LRU Policy state.
#[derive(Clone, Debug)]
pub struct LruPolicy {
    /// A vector of usage stacks (one per set).
    /// Index 0 is MRU, last index is LRU.
    usage: Vec<Vec<usize>>,
    ways: usize,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the buffer.
    /// * `ways` - The associativity (number of ways) of the buffer.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: vec![(0..ways).collect(); sets],
            ways,
        }
    }
}

impl ReplacementPolicy for LruPolicy {
    /// Moves the accessed `way` to the front of the usage stack.
    fn touch(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    /// Returns the way at the bottom of the usage stack.
    fn victim(&self, set: usize) -> usize {
        self.usage[set].last().copied().unwrap_or(0)
    }

    fn reset(&mut self) {
        for stack in &mut self.usage {
            *stack = (0..self.ways).collect();
        }
    }

    fn clone_box(&self) -> Box<dyn ReplacementPolicy> {
        Box::new(self.clone())
    }
}
