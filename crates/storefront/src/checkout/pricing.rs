//! Order total derivation.
//!
//! Pure arithmetic over a cart subtotal; no jurisdiction lookup, no I/O.
//! One rule set is authoritative for both the displayed summary and the
//! persisted order, so the quoted amount is always the charged amount.

use serde::{Deserialize, Serialize};

use fungal_flux_core::Money;

/// Orders at or above this subtotal ship free.
pub const FREE_SHIPPING_THRESHOLD: Money = Money::from_cents(50_00);

/// Flat shipping fee below the free-shipping threshold.
pub const FLAT_SHIPPING_FEE: Money = Money::from_cents(9_99);

/// Flat tax rate, percent of subtotal.
pub const TAX_RATE_PERCENT: i64 = 8;

/// The totals could not be represented in 64-bit minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order totals out of range")]
pub struct TotalsOutOfRange;

/// Derived order totals, all in minor units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub total: Money,
}

impl OrderTotals {
    /// Compute shipping, tax, and grand total for a subtotal.
    ///
    /// Tax is 8% of the subtotal rounded half-up to the nearest whole
    /// dollar. `total == subtotal + shipping + tax` holds exactly.
    ///
    /// # Errors
    ///
    /// Returns [`TotalsOutOfRange`] if the grand total cannot fit in `i64`
    /// cents; unreachable for any realistic cart.
    pub fn compute(subtotal: Money) -> Result<Self, TotalsOutOfRange> {
        let shipping = if subtotal >= FREE_SHIPPING_THRESHOLD {
            Money::ZERO
        } else {
            FLAT_SHIPPING_FEE
        };

        let tax = Money::from_cents(round_tax_cents(subtotal.cents())?);

        let total = subtotal
            .checked_add(shipping)
            .and_then(|t| t.checked_add(tax))
            .ok_or(TotalsOutOfRange)?;

        Ok(Self {
            subtotal,
            shipping,
            tax,
            total,
        })
    }
}

/// 8% of `subtotal_cents`, rounded half-up to a whole dollar, in cents.
fn round_tax_cents(subtotal_cents: i64) -> Result<i64, TotalsOutOfRange> {
    let raw = subtotal_cents
        .checked_mul(TAX_RATE_PERCENT)
        .ok_or(TotalsOutOfRange)?;
    // raw is in 1/10000 dollars; add half a dollar before dividing to round.
    let dollars = raw.checked_add(5_000).ok_or(TotalsOutOfRange)? / 10_000;
    dollars.checked_mul(100).ok_or(TotalsOutOfRange)
}
