//! Decimal money amounts.
//!
//! The storefront trades in a single currency (USD), so `Money` is a thin
//! wrapper over [`Decimal`] that keeps arithmetic exact and formats as `$x.yz`.
//! The operators saturate at the decimal bounds; callers that must not lose
//! precision use the `checked_*` methods.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Mul};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// A USD amount in dollars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(Decimal);

impl Money {
    /// Zero dollars.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create an amount from a decimal dollar value.
    #[must_use]
    pub const fn new(amount: Decimal) -> Self {
        Self(amount)
    }

    /// Create an amount from a number of cents.
    #[must_use]
    pub fn from_cents(cents: i64) -> Self {
        Self(Decimal::new(cents, 2))
    }

    /// The underlying decimal amount.
    #[must_use]
    pub const fn amount(self) -> Decimal {
        self.0
    }

    /// Whether the amount is below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0.is_sign_negative() && !self.0.is_zero()
    }

    /// Round to whole cents, halves away from zero.
    #[must_use]
    pub fn round_to_cents(self) -> Self {
        Self(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Multiply by a rate (e.g. a tax percentage) and round to cents.
    #[must_use]
    pub fn percent_of(self, rate: Decimal) -> Self {
        Self(self.0.saturating_mul(rate)).round_to_cents()
    }

    /// Like [`Money::percent_of`], or `None` on overflow.
    #[must_use]
    pub fn checked_percent_of(self, rate: Decimal) -> Option<Self> {
        self.0.checked_mul(rate).map(|amount| Self(amount).round_to_cents())
    }

    /// `self + rhs`, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// `self × quantity`, or `None` on overflow.
    #[must_use]
    pub fn checked_mul(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rounded = self.round_to_cents().0;
        if rounded.is_sign_negative() && !rounded.is_zero() {
            write!(f, "-${:.2}", rounded.abs())
        } else {
            write!(f, "${rounded:.2}")
        }
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Self(amount)
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 = self.0.saturating_add(rhs.0);
    }
}

impl Mul<u32> for Money {
    type Output = Self;

    fn mul(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(Decimal::from(quantity)))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(999).to_string(), "$9.99");
        assert_eq!(Money::from_cents(5000).to_string(), "$50.00");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
        assert_eq!(Money::from_cents(-250).to_string(), "-$2.50");
    }

    #[test]
    fn test_arithmetic() {
        let price = Money::from_cents(1000);
        assert_eq!(price * 2, Money::from_cents(2000));
        let total: Money = [price, Money::from_cents(99)].into_iter().sum();
        assert_eq!(total, Money::from_cents(1099));
    }

    #[test]
    fn test_overflow_is_checked_or_saturated() {
        let huge = Money::new(Decimal::MAX);
        assert_eq!(huge.checked_mul(2), None);
        assert_eq!(huge.checked_add(Money::from_cents(1)), None);
        assert_eq!(huge.checked_percent_of(Decimal::from(2)), None);
        assert_eq!(huge * 2, huge);
        assert_eq!(huge + huge, huge);
        assert_eq!(Money::from_cents(250).checked_mul(4), Some(Money::from_cents(1000)));
    }

    #[test]
    fn test_percent_rounds_half_away_from_zero() {
        // 0.08 * 0.3125 = 0.025 -> 0.03
        let amount = Money::new(Decimal::new(3125, 4));
        assert_eq!(amount.percent_of(Decimal::new(8, 2)), Money::from_cents(3));
    }

    #[test]
    fn test_deserialize_from_string_and_number() {
        let a: Money = serde_json::from_str("\"12.50\"").unwrap();
        let b: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(a, b);
    }
}
