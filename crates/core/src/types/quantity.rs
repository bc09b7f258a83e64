//! Positive line quantities.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`] strictly.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative quantities are not representable.
    #[error("quantity must be at least 1 (got {0})")]
    NotPositive(i64),
    /// The value does not fit in a `u32`.
    #[error("quantity must be at most {max} (got {got})", max = u32::MAX)]
    TooLarge {
        /// The rejected value.
        got: i64,
    },
}

/// A line quantity, always at least one.
///
/// Use [`Quantity::new`] where invalid input must be rejected (e.g. server
/// payloads) and [`Quantity::clamped`] where it is silently corrected
/// (user-entered cart updates).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u32")]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity, rejecting values below one.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError`] if `value` is not in `1..=u32::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        let value32 = u32::try_from(value).map_err(|_| {
            if value < 1 {
                QuantityError::NotPositive(value)
            } else {
                QuantityError::TooLarge { got: value }
            }
        })?;
        NonZeroU32::new(value32)
            .map(Self)
            .ok_or(QuantityError::NotPositive(value))
    }

    /// Create a quantity, correcting anything below one to one.
    ///
    /// Values above `u32::MAX` saturate.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        match Self::new(value) {
            Ok(quantity) => quantity,
            Err(QuantityError::NotPositive(_)) => Self::ONE,
            Err(QuantityError::TooLarge { .. }) => Self(NonZeroU32::MAX),
        }
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0.get()
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<NonZeroU32> for Quantity {
    fn from(value: NonZeroU32) -> Self {
        Self(value)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.get()
    }
}
