//! Exact monetary amounts in integer minor units.
//!
//! All money inside the system is a count of cents. `rust_decimal` is used
//! only at the parse/format boundaries (remote store rows carry prices as
//! decimal strings, displays want `$X.XX`); arithmetic never touches
//! floating point.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when converting into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MoneyError {
    /// The input is not a parseable decimal number.
    #[error("not a valid decimal amount: {0}")]
    InvalidNumber(String),
    /// The input has more than two fractional digits.
    #[error("amount has sub-cent precision: {0}")]
    SubCentPrecision(String),
    /// The input is negative.
    #[error("amount is negative: {0}")]
    Negative(String),
    /// The amount does not fit in 64-bit minor units.
    #[error("amount out of range")]
    OutOfRange,
}

/// A monetary amount in minor units (cents).
///
/// Serializes as a bare integer, which is also the wire representation the
/// remote store and payment gateway use for amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero cents.
    pub const ZERO: Self = Self(0);

    /// Create a `Money` from a count of cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// The amount in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Whether this is exactly zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Convert a non-negative decimal amount (in major units) into cents.
    ///
    /// # Errors
    ///
    /// Returns an error if the amount is negative, carries more than two
    /// fractional digits, or does not fit in `i64` cents.
    pub fn from_decimal(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount.to_string()));
        }

        let cents = amount
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::OutOfRange)?;
        if cents.fract() != Decimal::ZERO {
            return Err(MoneyError::SubCentPrecision(amount.to_string()));
        }

        cents.trunc().to_i64().map(Self).ok_or(MoneyError::OutOfRange)
    }

    /// Parse a decimal string (e.g. `"24.99"`) into cents.
    ///
    /// This is the single entry point for prices arriving as strings from
    /// the remote store.
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid non-negative decimal
    /// with at most two fractional digits.
    pub fn parse(s: &str) -> Result<Self, MoneyError> {
        let amount: Decimal = s
            .trim()
            .parse()
            .map_err(|_| MoneyError::InvalidNumber(s.to_string()))?;
        Self::from_decimal(amount)
    }

    /// The amount in major units as an exact decimal.
    #[must_use]
    pub fn to_decimal(self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Checked addition.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }

    /// Checked multiplication by a quantity.
    #[must_use]
    pub const fn checked_mul(self, quantity: u32) -> Option<Self> {
        match self.0.checked_mul(quantity as i64) {
            Some(cents) => Some(Self(cents)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let amount = self.to_decimal();
        if amount.is_sign_negative() {
            write!(f, "-${}", amount.abs())
        } else {
            write!(f, "${amount}")
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exact() {
        assert_eq!(Money::parse("24.99").unwrap(), Money::from_cents(2499));
        assert_eq!(Money::parse("50").unwrap(), Money::from_cents(5000));
        assert_eq!(Money::parse("0.05").unwrap(), Money::from_cents(5));
        assert_eq!(Money::parse(" 9.99 ").unwrap(), Money::from_cents(999));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!(
            Money::parse("abc"),
            Err(MoneyError::InvalidNumber(_))
        ));
        assert!(matches!(Money::parse(""), Err(MoneyError::InvalidNumber(_))));
    }

    #[test]
    fn test_parse_rejects_sub_cent() {
        assert!(matches!(
            Money::parse("1.999"),
            Err(MoneyError::SubCentPrecision(_))
        ));
    }

    #[test]
    fn test_parse_rejects_negative() {
        assert!(matches!(Money::parse("-1.00"), Err(MoneyError::Negative(_))));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(2499).to_string(), "$24.99");
        assert_eq!(Money::from_cents(500).to_string(), "$5.00");
        assert_eq!(Money::ZERO.to_string(), "$0.00");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_cents(2499);
        assert_eq!(a.checked_add(Money::from_cents(1)), Some(Money::from_cents(2500)));
        assert_eq!(a.checked_mul(3), Some(Money::from_cents(7497)));
        assert_eq!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)), None);
        assert_eq!(Money::from_cents(i64::MAX).checked_mul(2), None);
    }

    #[test]
    fn test_serde_as_cents() {
        let json = serde_json::to_string(&Money::from_cents(2499)).unwrap();
        assert_eq!(json, "2499");
        let back: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Money::from_cents(2499));
    }

    #[test]
    fn test_decimal_roundtrip_is_exact() {
        // 0.1 + 0.2 style drift cannot happen with integer cents.
        let sum = Money::parse("0.10")
            .unwrap()
            .checked_add(Money::parse("0.20").unwrap())
            .unwrap();
        assert_eq!(sum, Money::from_cents(30));
        assert_eq!(sum.to_decimal().to_string(), "0.30");
    }
}
