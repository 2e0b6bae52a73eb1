//! Shipping and billing addresses.
//!
//! The same shape is used for both addresses; a billing address may be a
//! copy of the shipping address when the shopper ticks "same as shipping".
//! Field-level validation gates the forward checkout transitions; failures
//! are surfaced per field, never as a fatal error.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use fungal_flux_core::Email;

/// Per-field validation messages, keyed by input field name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// A validated postal address with contact details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub full_name: String,
    pub email: Email,
    pub phone: String,
    pub address_line1: String,
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
}

/// Raw address input as submitted by the shopper.
///
/// Call [`AddressForm::validate`] to obtain an [`Address`]; nothing else in
/// the checkout accepts unvalidated address data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl AddressForm {
    /// Validate every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns the full per-field error map when any field fails; the
    /// checkout stays on its current step and shows these inline.
    pub fn validate(&self) -> Result<Address, FieldErrors> {
        let mut errors = FieldErrors::new();

        let full_name = self.full_name.trim();
        if full_name.is_empty() {
            errors.insert("full_name", "Full name is required".into());
        } else if full_name.chars().count() < 2 {
            errors.insert("full_name", "Full name must be at least 2 characters".into());
        } else if full_name.chars().count() > 100 {
            errors.insert("full_name", "Full name must not exceed 100 characters".into());
        }

        let email = match Email::parse(&self.email) {
            Ok(email) => Some(email),
            Err(_) if self.email.trim().is_empty() => {
                errors.insert("email", "Email is required".into());
                None
            }
            Err(_) => {
                errors.insert("email", "Please enter a valid email address".into());
                None
            }
        };

        let phone = self.phone.trim();
        if phone.is_empty() {
            errors.insert("phone", "Phone number is required".into());
        } else if !is_valid_phone(phone) {
            errors.insert("phone", "Please enter a valid phone number".into());
        }

        let line1 = self.address_line1.trim();
        if line1.is_empty() {
            errors.insert("address_line1", "Address is required".into());
        } else if line1.chars().count() < 5 {
            errors.insert("address_line1", "Address must be at least 5 characters".into());
        } else if line1.chars().count() > 100 {
            errors.insert("address_line1", "Address must not exceed 100 characters".into());
        }

        let line2 = self
            .address_line2
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty());
        if line2.is_some_and(|s| s.chars().count() > 100) {
            errors.insert(
                "address_line2",
                "Address line 2 must not exceed 100 characters".into(),
            );
        }

        let city = self.city.trim();
        if city.is_empty() {
            errors.insert("city", "City is required".into());
        } else if city.chars().count() < 2 {
            errors.insert("city", "City must be at least 2 characters".into());
        } else if city.chars().count() > 50 {
            errors.insert("city", "City must not exceed 50 characters".into());
        }

        let state = self.state.trim();
        if state.is_empty() {
            errors.insert("state", "State is required".into());
        }

        let postal_code = self.postal_code.trim();
        if postal_code.is_empty() {
            errors.insert("postal_code", "ZIP code is required".into());
        } else if !is_valid_postal_code(postal_code) {
            errors.insert(
                "postal_code",
                "Please enter a valid ZIP code (12345 or 12345-6789)".into(),
            );
        }

        let country = self.country.trim();
        if country.is_empty() {
            errors.insert("country", "Country is required".into());
        }

        if !errors.is_empty() {
            return Err(errors);
        }

        // `email` is always Some here: a missing value inserted an error above.
        let Some(email) = email else {
            return Err(errors);
        };

        Ok(Address {
            full_name: full_name.to_string(),
            email,
            phone: phone.to_string(),
            address_line1: line1.to_string(),
            address_line2: line2.map(ToString::to_string),
            city: city.to_string(),
            state: state.to_string(),
            postal_code: postal_code.to_string(),
            country: country.to_string(),
        })
    }
}

/// E.164-ish check: optional `+`, leading digit 1-9, at most 16 digits total.
/// Separators (spaces, dashes, parentheses) are stripped before checking.
fn is_valid_phone(raw: &str) -> bool {
    let compact: String = raw
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();
    let digits = compact.strip_prefix('+').unwrap_or(&compact);
    let mut chars = digits.chars();
    match chars.next() {
        Some(first) if ('1'..='9').contains(&first) => {}
        _ => return false,
    }
    digits.len() <= 16 && chars.all(|c| c.is_ascii_digit())
}

/// `12345` or `12345-6789`.
fn is_valid_postal_code(raw: &str) -> bool {
    let (zip, plus4) = match raw.split_once('-') {
        Some((zip, plus4)) => (zip, Some(plus4)),
        None => (raw, None),
    };
    let zip_ok = zip.len() == 5 && zip.bytes().all(|b| b.is_ascii_digit());
    let plus4_ok = plus4.is_none_or(|p| p.len() == 4 && p.bytes().all(|b| b.is_ascii_digit()));
    zip_ok && plus4_ok
}
