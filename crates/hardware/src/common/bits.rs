//! Fixed-width bit vectors.
//!
//! Architecture descriptions express segment bounds as bit vectors of an
//! explicit width. Keeping the width next to the value lets the model reject
//! a bound whose width disagrees with its address type at construction time.

use serde::Deserialize;

use super::error::ArchError;

/// Largest width a [`Bits`] value may carry.
pub const MAX_WIDTH: u32 = 64;

/// A value together with the number of bits it is declared to occupy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
pub struct Bits {
    /// Raw value; only the low `width` bits may be set.
    pub value: u64,
    /// Declared width in bits (`1..=64`).
    pub width: u32,
}

impl Bits {
    /// Creates a bit vector, checking that `value` fits in `width` bits.
    ///
    /// # Arguments
    ///
    /// * `name` - Identifier used in the error if validation fails.
    /// * `value` - The raw value.
    /// * `width` - Declared width in bits.
    ///
    /// # Errors
    ///
    /// As for [`Bits::validate`].
    pub fn new(name: &str, value: u64, width: u32) -> Result<Self, ArchError> {
        let bits = Self { value, width };
        bits.validate(name)?;
        Ok(bits)
    }

    /// Checks the width range and that the value fits.
    ///
    /// # Errors
    ///
    /// [`ArchError::InvalidWidth`] for a width outside `1..=64` and
    /// [`ArchError::ValueTooWide`] when bits above `width` are set.
    pub fn validate(&self, name: &str) -> Result<(), ArchError> {
        if self.width == 0 || self.width > MAX_WIDTH {
            return Err(ArchError::InvalidWidth {
                name: name.to_owned(),
                width: self.width,
            });
        }
        if self.value & !mask(self.width) != 0 {
            return Err(ArchError::ValueTooWide {
                name: name.to_owned(),
                value: self.value,
                width: self.width,
            });
        }
        Ok(())
    }
}

/// Returns a mask with the low `width` bits set.
///
/// `width` values of 64 and above saturate to all ones; zero yields zero.
#[inline]
pub const fn mask(width: u32) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Returns a mask covering the closed bit range `[lo, hi]`.
#[inline]
pub const fn range_mask(lo: u32, hi: u32) -> u64 {
    mask(hi + 1) & !mask(lo)
}
