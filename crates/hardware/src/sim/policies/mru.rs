//! Most Recently Used (MRU) Replacement Policy.
//!
//! This policy evicts the way that was accessed most recently. It is useful
//! for driving cyclic patterns larger than the buffer, and it is the policy
//! under which eviction-based goals are hardest to reach.

use super::ReplacementPolicy;

/// MRU Policy state.
#[derive(Clone, Debug)]
pub struct MruPolicy {
    /// A vector of usage stacks (one per set).
    /// Index 0 is the MRU position (victim).
    usage: Vec<Vec<usize>>,
    ways: usize,
}

impl MruPolicy {
    /// Creates a new MRU policy instance.
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

impl ReplacementPolicy for MruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        let stack = &mut self.usage[set];
        if let Some(pos) = stack.iter().position(|&x| x == way) {
            let _ = stack.remove(pos);
        }
        stack.insert(0, way);
    }

    fn victim(&self, set: usize) -> usize {
        self.usage[set].first().copied().unwrap_or(0)
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
