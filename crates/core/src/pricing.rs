//! Cart pricing: subtotal, flat-rate shipping with a free-shipping threshold,
//! and sales tax.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::Money;

/// Shipping and tax parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingRules {
    /// Subtotals at or above this amount ship free.
    pub free_shipping_threshold: Money,
    /// Shipping fee charged below the threshold.
    pub flat_shipping_fee: Money,
    /// Tax rate applied to the subtotal (0.08 = 8%).
    pub tax_rate: Decimal,
}

impl Default for PricingRules {
    fn default() -> Self {
        Self {
            free_shipping_threshold: Money::from_cents(5000),
            flat_shipping_fee: Money::from_cents(999),
            tax_rate: Decimal::new(8, 2),
        }
    }
}

/// Computed totals for a set of priced lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl Totals {
    /// Totals for an empty cart.
    pub const EMPTY: Self = Self {
        subtotal: Money::ZERO,
        shipping: Money::ZERO,
        tax: Money::ZERO,
        total: Money::ZERO,
    };
}

impl PricingRules {
    /// Shipping fee for a given subtotal. Empty carts ship nothing.
    #[must_use]
    pub fn shipping_for(&self, subtotal: Money) -> Money {
        if subtotal == Money::ZERO || subtotal >= self.free_shipping_threshold {
            Money::ZERO
        } else {
            self.flat_shipping_fee
        }
    }

    /// Price a subtotal.
    #[must_use]
    pub fn totals(&self, subtotal: Money) -> Totals {
        let shipping = self.shipping_for(subtotal);
        let tax = subtotal.percent_of(self.tax_rate);
        Totals {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }

    /// Price `(unit price, quantity)` lines.
    #[must_use]
    pub fn price_lines(&self, lines: impl IntoIterator<Item = (Money, u32)>) -> Totals {
        let subtotal = lines.into_iter().map(|(price, qty)| price * qty).sum();
        self.totals(subtotal)
    }

    /// Price lines like [`PricingRules::price_lines`], or `None` if any
    /// amount overflows.
    #[must_use]
    pub fn checked_price_lines(&self, lines: impl IntoIterator<Item = (Money, u32)>) -> Option<Totals> {
        let subtotal = lines
            .into_iter()
            .try_fold(Money::ZERO, |acc, (price, qty)| acc.checked_add(price.checked_mul(qty)?))?;
        let shipping = self.shipping_for(subtotal);
        let tax = subtotal.checked_percent_of(self.tax_rate)?;
        Some(Totals {
            subtotal,
            shipping,
            tax,
            total: subtotal.checked_add(shipping)?.checked_add(tax)?,
        })
    }
}
