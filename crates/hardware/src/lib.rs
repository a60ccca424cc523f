//! Memory-hierarchy hazard model and goal-directed address synthesizer.
//!
//! This crate drives caches, TLBs and other associative buffers into specific
//! states so that generated processor tests exercise memory-subsystem corner
//! cases. It implements the following:
//! 1. **Architecture:** Address types, segments and buffers, with bit-field decomposition.
//! 2. **Simulation:** Per-buffer hit/miss/replace classification over a buffer hierarchy.
//! 3. **Hazards:** Pairwise relations between accesses to the same buffer, grouped per access.
//! 4. **Filters:** Rejection of hazard combinations that are unsatisfiable or undefined.
//! 5. **Loader:** Bounded search for the accesses that force a buffer into a wanted state.
//! 6. **Generation:** Lazy, restartable production of validated candidate sequences.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use memhaz_core::{ArchModel, FilterPipeline, GoalReacher, SequenceRun};
//! use memhaz_core::loader::{Goal, Reach};
//! use memhaz_core::sim::BufferAccessEvent;
//!
//! let arch = ArchModel::from_json(r#"{
//!     "address_types": [ { "name": "PA", "width": 16, "kind": "Physical" } ],
//!     "segments": [ { "name": "RAM", "address_type": "PA",
//!                     "start": { "value": 0, "width": 16 },
//!                     "end": { "value": 65535, "width": 16 } } ],
//!     "buffers": [ { "name": "L1", "address_type": "PA", "sets": 1, "ways": 2, "line_bits": 4 } ]
//! }"#).unwrap();
//! let arch = Arc::new(arch);
//! let l1 = arch.buffer_id("L1").unwrap();
//!
//! let run = SequenceRun::new(Arc::clone(&arch), FilterPipeline::standard());
//! let goal = Goal { buffer: l1, event: BufferAccessEvent::Replace, address: 0x0000 };
//! let pool = [0x0010, 0x0020, 0x0030];
//!
//! let reach = GoalReacher::default().reach(&run, l1, goal, &pool).unwrap();
//! let Reach::Reached(loader) = reach else { panic!("goal should be reachable") };
//! assert_eq!(loader.loads, vec![0x0010, 0x0020]);
//! ```

/// Architecture model (address types, segments, buffers, bit fields).
pub mod arch;
/// Common types (bit vectors, errors).
pub mod common;
/// Architecture description and generator configuration.
pub mod config;
/// Hazard filter pipeline.
pub mod filter;
/// Lazy candidate-sequence generation.
pub mod generator;
/// Hazard analysis between accesses.
pub mod hazard;
/// Goal-directed loader.
pub mod loader;
/// Roll-back-safe generation run.
pub mod run;
/// Buffer simulation.
pub mod sim;
/// Run statistics.
pub mod stats;

/// Validated architecture model; build with `ArchModel::new` or `ArchModel::from_json`.
pub use crate::arch::ArchModel;
/// Crate-level error and result types.
pub use crate::common::{Error, Result};
/// Filter pipeline; `FilterPipeline::standard()` holds the canonical filters.
pub use crate::filter::FilterPipeline;
/// Lazy producer of candidate sequences.
pub use crate::generator::SequenceGenerator;
/// Goal-directed loader.
pub use crate::loader::GoalReacher;
/// One generation run.
pub use crate::run::SequenceRun;
