//! Type-safe price representation using decimal arithmetic.
//!
//! Prices are kept as [`Decimal`] so cart totals are exact: five units at
//! `4.99` is `24.95`, not `24.950000000000003`.

use core::fmt;
use core::iter::Sum;
use core::ops::Add;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Quantity;

/// A price in the store currency (Indian rupees).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Currency symbol used when rendering prices.
    pub const SYMBOL: &'static str = "₹";

    /// A zero price.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a new price.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create a price from an amount in paise (hundredths).
    #[must_use]
    pub fn from_minor(minor: i64) -> Self {
        Self(Decimal::new(minor, 2))
    }

    /// The decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Price of `quantity` units at this unit price.
    ///
    /// Saturates at the decimal range instead of overflowing.
    #[must_use]
    pub fn times(self, quantity: Quantity) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity.get())))
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }
}

impl Add for Price {
    type Output = Self;

    /// Saturating, so server-supplied amounts can never overflow a total.
    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

impl From<Decimal> for Price {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{:.2}", Self::SYMBOL, self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qty(n: u32) -> Quantity {
        Quantity::new(i64::from(n)).expect("positive quantity")
    }

    #[test]
    fn test_times_is_exact() {
        let unit = Price::from_minor(499);
        assert_eq!(unit.times(qty(5)), Price::from_minor(2495));
    }

    #[test]
    fn test_sum() {
        let total: Price = [Price::from_minor(199), Price::from_minor(1)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_minor(200));
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let unit = Price::new(Decimal::from_i128_with_scale(10_000_000_000_000_000_905_969_664, 0));
        assert_eq!(unit.times(qty(10_000)), Price::new(Decimal::MAX));

        let total: Price = [Price::new(Decimal::MAX), Price::from_minor(100)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::new(Decimal::MAX));
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(Price::from_minor(2495).to_string(), "₹24.95");
        assert_eq!(Price::new(Decimal::from(3)).to_string(), "₹3.00");
    }
}
