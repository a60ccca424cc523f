//! Configuration inputs for the hazard model.
//!
//! This module defines the structures the core consumes. It provides:
//! 1. **Defaults:** Baseline search bounds for the goal-directed loader.
//! 2. **Architecture Description:** The resolved address types, segments and buffers
//!    produced by the architecture-description compiler.
//! 3. **Enums:** Address kinds and replacement policies.
//!
//! Descriptions are supplied as JSON (see [`ArchDescription`]) or built directly in Rust.

use serde::Deserialize;

use crate::common::Bits;

/// Default bounds for sequence generation and goal search.
mod defaults {
    /// Number of alias-pool rotations the loader tries before giving up on a goal.
    pub const MAX_GOAL_ATTEMPTS: usize = 8;

    /// Upper bound on synthesized loads for a single goal attempt.
    pub const MAX_LOADS_PER_GOAL: usize = 64;

    /// Number of alias addresses drawn from a segment for one goal.
    pub const ALIAS_POOL_SIZE: usize = 32;
}

/// Whether an address type names virtual or physical addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum AddressKind {
    /// Addresses translated before reaching physical storage.
    #[default]
    Virtual,
    /// Physical addresses.
    Physical,
}

/// Replacement policy of an associative buffer.
///
/// Every policy is deterministic so that repeated runs over the same sequence
/// produce identical events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReplacementPolicy {
    /// Least Recently Used; ties broken by lowest way index.
    #[default]
    #[serde(alias = "Lru")]
    Lru,
    /// Pseudo-LRU (bit-vector approximation).
    #[serde(alias = "Plru")]
    Plru,
    /// First In First Out (round-robin per set).
    #[serde(alias = "Fifo")]
    Fifo,
    /// Most Recently Used.
    #[serde(alias = "Mru")]
    Mru,
}

/// Declaration of an address type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressTypeDescription {
    /// Unique identifier.
    pub name: String,
    /// Address width in bits (`1..=64`).
    pub width: u32,
    /// Virtual or physical.
    #[serde(default)]
    pub kind: AddressKind,
}

/// Linear mapping of a segment onto another address type.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TranslationDescription {
    /// Address type the segment translates into.
    pub target_type: String,
    /// Address in the target type that `start` maps to.
    pub base: u64,
}

/// Declaration of a contiguous segment of an address space.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SegmentDescription {
    /// Unique identifier (the address-argument identifier).
    pub name: String,
    /// Address type the bounds belong to.
    pub address_type: String,
    /// First address of the segment, inclusive.
    pub start: Bits,
    /// Last address of the segment, inclusive.
    pub end: Bits,
    /// Optional translation into another address type.
    #[serde(default)]
    pub translation: Option<TranslationDescription>,
}

/// Declaration of an associative buffer (cache, TLB, ...).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BufferDescription {
    /// Unique identifier.
    pub name: String,
    /// Address type of the addresses this buffer is probed with.
    pub address_type: String,
    /// Number of sets; must be a power of two.
    pub sets: usize,
    /// Associativity.
    pub ways: usize,
    /// Width of the line-offset field in bits.
    #[serde(default)]
    pub line_bits: u32,
    /// Replacement policy.
    #[serde(default)]
    pub policy: ReplacementPolicy,
    /// Identifier of the parent buffer, if any.
    #[serde(default)]
    pub parent: Option<String>,
    /// Whether this buffer is a view onto its parent.
    #[serde(default)]
    pub view: bool,
}

/// Fully resolved architecture description.
///
/// This is the sole construction input of [`ArchModel`](crate::arch::ArchModel).
///
/// # Examples
///
/// ```
/// use memhaz_core::config::{ArchDescription, ReplacementPolicy};
///
/// let json = r#"{
///     "address_types": [ { "name": "PA", "width": 32, "kind": "Physical" } ],
///     "segments": [
///         { "name": "RAM", "address_type": "PA",
///           "start": { "value": 0, "width": 32 },
///           "end": { "value": 4294967295, "width": 32 } }
///     ],
///     "buffers": [
///         { "name": "L1", "address_type": "PA", "sets": 64, "ways": 4,
///           "line_bits": 6, "policy": "LRU" }
///     ]
/// }"#;
///
/// let desc: ArchDescription = serde_json::from_str(json).unwrap();
/// assert_eq!(desc.buffers[0].ways, 4);
/// assert_eq!(desc.buffers[0].policy, ReplacementPolicy::Lru);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ArchDescription {
    /// Address type declarations.
    #[serde(default)]
    pub address_types: Vec<AddressTypeDescription>,
    /// Segment declarations.
    #[serde(default)]
    pub segments: Vec<SegmentDescription>,
    /// Buffer declarations, in any order (parents may be declared after children).
    #[serde(default)]
    pub buffers: Vec<BufferDescription>,
}

/// Bounds used by sequence generation and the goal-directed loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Alias-pool rotations tried per goal before reporting it unreachable.
    pub max_goal_attempts: usize,
    /// Maximum number of loads synthesized in one attempt.
    pub max_loads_per_goal: usize,
    /// Number of alias addresses drawn for a goal.
    pub alias_pool_size: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            max_goal_attempts: defaults::MAX_GOAL_ATTEMPTS,
            max_loads_per_goal: defaults::MAX_LOADS_PER_GOAL,
            alias_pool_size: defaults::ALIAS_POOL_SIZE,
        }
    }
}
