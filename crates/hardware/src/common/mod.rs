//! Common utilities and types shared by every component of the hazard model.
//!
//! This module provides the fundamental building blocks:
//! 1. **Bit Vectors:** Fixed-width values used for segment bounds and masks.
//! 2. **Error Handling:** Construction errors, run errors and filter defects.

/// Fixed-width bit vectors and mask helpers.
pub mod bits;

/// Error types for construction, addressing and filter defects.
pub mod error;

pub use bits::Bits;
pub use error::{ArchError, Error, FilterDefect, Result};
