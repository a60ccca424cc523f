//! Error taxonomy for the hazard model.
//!
//! This module defines the failure conditions of the core. It provides:
//! 1. **Construction Errors:** `ArchError`, raised while validating an architecture description.
//! 2. **Run Errors:** `Error`, the crate-level error for addressing faults and filter defects.
//! 3. **Filter Defects:** `FilterDefect`, an internal-consistency violation raised by a filter.
//!
//! Filter rejections and unreachable goals are not errors; they are ordinary
//! return values (`Verdict`, `Reach`) and never travel through these types.

use thiserror::Error;

/// Malformed or inconsistent architecture description.
///
/// Raised only while building an [`ArchModel`](crate::arch::ArchModel); a model
/// that was built successfully never produces one of these later.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ArchError {
    /// An address type or bit vector declares a width outside `1..=64`.
    #[error("invalid bit width {width} for `{name}` (expected 1..=64)")]
    InvalidWidth {
        /// Identifier of the offending declaration.
        name: String,
        /// The declared width.
        width: u32,
    },

    /// A value does not fit in its declared bit width.
    #[error("value {value:#x} of `{name}` does not fit in {width} bits")]
    ValueTooWide {
        /// Identifier of the offending declaration.
        name: String,
        /// The raw value.
        value: u64,
        /// The declared width.
        width: u32,
    },

    /// Segment bounds and address type disagree on width.
    #[error("segment `{segment}` bounds are {found} bits wide but address type is {expected} bits")]
    WidthMismatch {
        /// Segment identifier.
        segment: String,
        /// Width of the segment's address type.
        expected: u32,
        /// Width found on one of the bounds.
        found: u32,
    },

    /// Segment start lies above its end.
    #[error("segment `{segment}` range is inverted ({start:#x} > {end:#x})")]
    InvertedRange {
        /// Segment identifier.
        segment: String,
        /// Declared start.
        start: u64,
        /// Declared end.
        end: u64,
    },

    /// Two declarations of the same kind share an identifier.
    #[error("duplicate {kind} identifier `{name}`")]
    DuplicateIdentifier {
        /// Kind of declaration (`address type`, `segment`, `buffer`).
        kind: &'static str,
        /// The colliding identifier.
        name: String,
    },

    /// A declaration refers to an address type that does not exist.
    #[error("`{owner}` refers to unknown address type `{name}`")]
    UnknownAddressType {
        /// Declaration holding the reference.
        owner: String,
        /// The unresolved identifier.
        name: String,
    },

    /// A buffer names a parent that was never declared.
    #[error("buffer `{buffer}` refers to unknown parent `{parent}`")]
    UnknownParent {
        /// Child buffer.
        buffer: String,
        /// The unresolved parent identifier.
        parent: String,
    },

    /// Following parent links from a buffer leads back to it.
    #[error("parent chain of buffer `{buffer}` contains a cycle")]
    ParentCycle {
        /// A buffer on the cycle.
        buffer: String,
    },

    /// A view buffer has no parent to mirror.
    #[error("view buffer `{buffer}` has no parent")]
    ViewWithoutParent {
        /// The view buffer.
        buffer: String,
    },

    /// Buffer geometry is unusable (zero ways, non power-of-two sets, ...).
    #[error("buffer `{buffer}` has invalid geometry: {reason}")]
    InvalidGeometry {
        /// The buffer.
        buffer: String,
        /// Human-readable reason.
        reason: String,
    },

    /// The description text is not a well-formed description document.
    #[error("malformed architecture description: {0}")]
    Parse(String),
}

/// A filter failed on well-formed input.
///
/// This is a defect in the filter itself and is fatal to the run.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("filter `{filter}` failed: {reason}")]
pub struct FilterDefect {
    /// Name of the failing filter.
    pub filter: &'static str,
    /// Description of the inconsistency.
    pub reason: String,
}

/// Crate-level error type.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum Error {
    /// The architecture description was rejected at construction.
    #[error("invalid architecture: {0}")]
    InvalidArchitecture(#[from] ArchError),

    /// A probe address falls outside every segment of the buffer's address type.
    ///
    /// Fatal to the current sequence attempt; the caller must choose another address.
    #[error("address {address:#x} is not mapped for buffer `{buffer}`")]
    AddressNotMapped {
        /// Buffer that was about to be probed.
        buffer: String,
        /// The unmapped address.
        address: u64,
    },

    /// A name lookup referred to a buffer the model does not declare.
    #[error("unknown buffer `{0}`")]
    UnknownBuffer(String),

    /// Internal-consistency violation inside a filter.
    #[error(transparent)]
    FilterDefect(#[from] FilterDefect),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;
