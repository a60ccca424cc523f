//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the oldest line in a set, regardless of how recently it
//! was hit. It operates as a round-robin pointer per set that only advances
//! when the way it points at is filled.

use super::ReplacementPolicy;

/// FIFO Policy state.
#[derive(Clone, Debug)]
pub struct FifoPolicy {
    /// Tracks the next way to be evicted for each set.
    next_way: Vec<usize>,
    /// Number of ways in the buffer.
    ways: usize,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the buffer.
    /// * `ways` - The associativity (number of ways) of the buffer.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            next_way: vec![0; sets],
            ways,
        }
    }
}

impl ReplacementPolicy for FifoPolicy {
    /// Hits do not change insertion order.
    fn touch(&mut self, _set: usize, _way: usize) {}

    /// Advances the pointer when the way it points at is filled.
    fn fill(&mut self, set: usize, way: usize) {
        if self.next_way[set] == way {
            self.next_way[set] = (self.next_way[set] + 1) % self.ways;
        }
    }

    fn victim(&self, set: usize) -> usize {
        self.next_way[set]
    }

    fn reset(&mut self) {
        self.next_way.fill(0);
    }

    fn clone_box(&self) -> Box<dyn ReplacementPolicy> {
        Box::new(self.clone())
    }
}
