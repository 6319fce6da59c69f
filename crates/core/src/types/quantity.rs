//! Positive line-item quantities.

use core::fmt;
use core::num::NonZeroU32;

use serde::{Deserialize, Serialize};

/// A cart quantity of at least one unit.
///
/// Zero is never representable: dropping a line to zero is a removal, not a
/// stored quantity. Raw user input arrives as `i64` (it may be negative
/// after a decrement or a typed value) and is checked through
/// [`Quantity::new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(NonZeroU32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(NonZeroU32::MIN);

    /// Create a quantity from raw input; `None` when `value < 1` or too large.
    #[must_use]
    pub fn new(value: i64) -> Option<Self> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
    }

    /// The quantity as a plain integer.
    #[must_use]
    pub const fn get(self) -> u32 {
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
        write!(f, "{}", self.0)
    }
}

impl From<Quantity> for i64 {
    fn from(quantity: Quantity) -> Self {
        Self::from(quantity.get())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), None);
        assert_eq!(Quantity::new(-3), None);
    }

    #[test]
    fn test_accepts_positive() {
        assert_eq!(Quantity::new(4).map(Quantity::get), Some(4));
        assert_eq!(Quantity::default(), Quantity::ONE);
    }

    #[test]
    fn test_rejects_overflow() {
        assert_eq!(Quantity::new(i64::from(u32::MAX) + 1), None);
    }
}
