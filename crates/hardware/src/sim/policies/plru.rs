//! Pseudo-LRU (PLRU) Replacement Policy.
//!
//! Bit-vector PLRU: each set keeps one "recently used" bit per way. Touching a
//! way sets its bit; when all bits become set, every bit except the touched one
//! is cleared. The victim is the lowest way whose bit is clear.
//!
//! Supports up to 64 ways.

use super::ReplacementPolicy;
use crate::common::bits::mask;

/// PLRU Policy state.
#[derive(Clone, Debug)]
pub struct PlruPolicy {
    /// MRU bits for each set.
    usage: Vec<u64>,
    /// Number of ways in the buffer.
    ways: usize,
}

impl PlruPolicy {
    /// Creates a new PLRU policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the buffer.
    /// * `ways` - The associativity (number of ways), at most 64.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            usage: vec![0; sets],
            ways,
        }
    }
}

impl ReplacementPolicy for PlruPolicy {
    fn touch(&mut self, set: usize, way: usize) {
        let bit = 1u64 << way;
        let all_ones = mask(self.ways as u32);
        self.usage[set] |= bit;
        if self.usage[set] & all_ones == all_ones {
            self.usage[set] = bit;
        }
    }

    fn victim(&self, set: usize) -> usize {
        (0..self.ways)
            .find(|&i| (self.usage[set] >> i) & 1 == 0)
            .unwrap_or(0)
    }

    fn reset(&mut self) {
        self.usage.fill(0);
    }

    fn clone_box(&self) -> Box<dyn ReplacementPolicy> {
        Box::new(self.clone())
    }
}
