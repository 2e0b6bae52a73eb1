//! Human-facing order numbers.
//!
//! Format: `FF-YYYYMMDD-NNNN` - a fixed shop prefix, the order date in the
//! shopper's local calendar, and a 4-digit random suffix. The suffix is not
//! unique by construction; the remote store holds a unique index on the
//! column and a collision surfaces as a retryable persistence error.

use core::fmt;

use chrono::NaiveDate;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing an [`OrderNumber`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderNumberError {
    /// The input does not match `FF-YYYYMMDD-NNNN`.
    #[error("order number must match FF-YYYYMMDD-NNNN: {0}")]
    BadFormat(String),
    /// The embedded date is not a real calendar date.
    #[error("order number embeds an invalid date: {0}")]
    BadDate(String),
}

/// A validated order number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderNumber(String);

impl OrderNumber {
    /// Shop prefix for all order numbers.
    pub const PREFIX: &'static str = "FF";

    /// Generate an order number for the given calendar date.
    ///
    /// The caller supplies the date so this stays clock-free; the storefront
    /// passes the session's local date.
    #[must_use]
    pub fn generate(date: NaiveDate) -> Self {
        let suffix: u16 = rand::rng().random_range(0..10_000);
        Self(format!(
            "{}-{}-{suffix:04}",
            Self::PREFIX,
            date.format("%Y%m%d")
        ))
    }

    /// Parse and validate an order number.
    ///
    /// # Errors
    ///
    /// Returns an error if the input does not match the documented format or
    /// embeds an impossible date.
    pub fn parse(s: &str) -> Result<Self, OrderNumberError> {
        let bad = || OrderNumberError::BadFormat(s.to_string());

        let rest = s.strip_prefix("FF-").ok_or_else(bad)?;
        let (date_part, suffix) = rest.split_once('-').ok_or_else(bad)?;
        if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        if suffix.len() != 4 || !suffix.bytes().all(|b| b.is_ascii_digit()) {
            return Err(bad());
        }
        NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|_| OrderNumberError::BadDate(s.to_string()))?;

        Ok(Self(s.to_string()))
    }

    /// The embedded order date.
    ///
    /// # Errors
    ///
    /// Never fails for values produced by [`generate`](Self::generate) or
    /// accepted by [`parse`](Self::parse).
    pub fn date(&self) -> Result<NaiveDate, OrderNumberError> {
        let date_part = self
            .0
            .get(3..11)
            .ok_or_else(|| OrderNumberError::BadFormat(self.0.clone()))?;
        NaiveDate::parse_from_str(date_part, "%Y%m%d")
            .map_err(|_| OrderNumberError::BadDate(self.0.clone()))
    }

    /// The order number as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrderNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for OrderNumber {
    type Err = OrderNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_matches_format() {
        for _ in 0..50 {
            let number = OrderNumber::generate(date(2024, 6, 15));
            let s = number.as_str();
            assert!(s.starts_with("FF-20240615-"), "{s}");
            assert_eq!(s.len(), "FF-20240615-0000".len());
            assert!(OrderNumber::parse(s).is_ok(), "{s}");
        }
    }

    #[test]
    fn test_generate_embeds_given_date() {
        let number = OrderNumber::generate(date(2026, 1, 2));
        assert_eq!(number.date().unwrap(), date(2026, 1, 2));
    }

    #[test]
    fn test_parse_valid() {
        let number = OrderNumber::parse("FF-20240615-0481").unwrap();
        assert_eq!(number.as_str(), "FF-20240615-0481");
        assert_eq!(number.date().unwrap(), date(2024, 6, 15));
    }

    #[test]
    fn test_parse_rejects_bad_shapes() {
        for bad in [
            "",
            "FF-20240615",
            "XX-20240615-0481",
            "FF-2024615-0481",
            "FF-20240615-48",
            "FF-20240615-04811",
            "FF-2024061a-0481",
            "FF-20240615-04x1",
            "ff-20240615-0481",
        ] {
            assert!(
                matches!(OrderNumber::parse(bad), Err(OrderNumberError::BadFormat(_))),
                "{bad}"
            );
        }
    }

    #[test]
    fn test_parse_rejects_impossible_date() {
        assert!(matches!(
            OrderNumber::parse("FF-20241341-0481"),
            Err(OrderNumberError::BadDate(_))
        ));
    }
}
