//! The multi-step checkout state machine.
//!
//! Steps run `Cart -> Shipping -> Billing -> Payment -> Review`. Every
//! forward transition has an entry condition; `back` steps the machine back
//! one, and backing out of Shipping leaves checkout for shop browsing. The
//! whole state is a serializable blob: handlers write it to the durable
//! session after every mutation and delete it only on successful order
//! placement or explicit cancellation, so a reload resumes mid-flow.

use core::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use fungal_flux_core::Money;

use crate::checkout::cart::Cart;
use crate::models::address::Address;

/// Transition errors. These are programming/staleness signals, not shopper
/// input problems; field validation happens before the machine is touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FlowError {
    /// An operation ran against the wrong step.
    #[error("checkout is at the {found} step, not {expected}")]
    WrongStep {
        expected: CheckoutStep,
        found: CheckoutStep,
    },
    /// The cart emptied while checkout was open.
    #[error("cart is empty")]
    EmptyCart,
    /// The stored state lost its shipping address.
    #[error("shipping address is missing")]
    MissingShippingAddress,
    /// A separate billing address was required but not supplied.
    #[error("billing address is missing")]
    MissingBillingAddress,
    /// Payment was never authorized for this checkout.
    #[error("payment has not been authorized")]
    NotAuthorized,
    /// Payment has not completed yet.
    #[error("payment has not completed")]
    NotPaid,
}

/// The five checkout steps, in flow order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutStep {
    Cart,
    Shipping,
    Billing,
    Payment,
    Review,
}

impl CheckoutStep {
    /// The previous step; `Cart` is its own predecessor (the backward edge
    /// out of `Cart` leaves checkout entirely).
    #[must_use]
    pub const fn back(self) -> Self {
        match self {
            Self::Cart | Self::Shipping => Self::Cart,
            Self::Billing => Self::Shipping,
            Self::Payment => Self::Billing,
            Self::Review => Self::Payment,
        }
    }
}

impl fmt::Display for CheckoutStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Cart => "cart",
            Self::Shipping => "shipping",
            Self::Billing => "billing",
            Self::Payment => "payment",
            Self::Review => "review",
        };
        write!(f, "{s}")
    }
}

/// The address/notes portion of the checkout, persisted across reloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutForm {
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub use_same_as_shipping: bool,
    pub order_notes: Option<String>,
}

impl Default for CheckoutForm {
    fn default() -> Self {
        Self {
            shipping_address: None,
            billing_address: None,
            use_same_as_shipping: true,
            order_notes: None,
        }
    }
}

/// A gateway authorization for a specific amount.
///
/// Single-use once confirmed; replaced whenever the computed total drifts
/// from the authorized amount.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentAuthorization {
    pub intent_id: String,
    pub client_secret: String,
    pub amount: Money,
}

/// The display-safe outcome of a confirmed payment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    pub reference_id: String,
    pub last4: String,
}

/// Full checkout session state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutState {
    /// Stable identity for this checkout attempt; keys the per-session
    /// submission lock.
    pub flow_id: Uuid,
    pub step: CheckoutStep,
    pub form: CheckoutForm,
    pub authorization: Option<PaymentAuthorization>,
    pub receipt: Option<PaymentReceipt>,
}

impl CheckoutState {
    /// Start a fresh checkout at the Shipping step.
    #[must_use]
    pub fn begin() -> Self {
        Self {
            flow_id: Uuid::new_v4(),
            step: CheckoutStep::Shipping,
            form: CheckoutForm::default(),
            authorization: None,
            receipt: None,
        }
    }

    /// Entry guard: checkout past the Cart step requires a non-empty cart.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::EmptyCart`] when the cart emptied underneath an
    /// open checkout; callers force the session back to shop browsing.
    pub fn guard_cart(&self, cart: &Cart) -> Result<(), FlowError> {
        if self.step > CheckoutStep::Cart && cart.is_empty() {
            return Err(FlowError::EmptyCart);
        }
        Ok(())
    }

    /// Require the machine to be at `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongStep`] otherwise.
    pub fn require_step(&self, expected: CheckoutStep) -> Result<(), FlowError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(FlowError::WrongStep {
                expected,
                found: self.step,
            })
        }
    }

    /// Store a validated shipping address and advance to Billing.
    ///
    /// While "same as shipping" is set, the billing address mirrors every
    /// shipping mutation immediately.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongStep`] unless at Shipping.
    pub fn submit_shipping(&mut self, address: Address) -> Result<(), FlowError> {
        self.require_step(CheckoutStep::Shipping)?;
        if self.form.use_same_as_shipping {
            self.form.billing_address = Some(address.clone());
        }
        self.form.shipping_address = Some(address);
        self.step = CheckoutStep::Billing;
        Ok(())
    }

    /// Toggle the "billing same as shipping" flag, re-syncing the billing
    /// address when it turns on.
    pub fn set_use_same_as_shipping(&mut self, use_same: bool) {
        self.form.use_same_as_shipping = use_same;
        if use_same {
            self.form.billing_address = self.form.shipping_address.clone();
        }
    }

    /// Store the billing address (or alias the shipping one) and advance to
    /// Payment. Entering Payment invalidates any earlier authorization and
    /// receipt: the totals they were built for may have changed.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongStep`] unless at Billing,
    /// [`FlowError::MissingShippingAddress`] if the stored state lost its
    /// shipping address, and [`FlowError::MissingBillingAddress`] if a
    /// separate billing address was required but absent.
    pub fn submit_billing(
        &mut self,
        address: Option<Address>,
        order_notes: Option<String>,
    ) -> Result<(), FlowError> {
        self.require_step(CheckoutStep::Billing)?;
        let shipping = self
            .form
            .shipping_address
            .clone()
            .ok_or(FlowError::MissingShippingAddress)?;

        self.form.billing_address = if self.form.use_same_as_shipping {
            Some(shipping)
        } else {
            Some(address.ok_or(FlowError::MissingBillingAddress)?)
        };
        self.form.order_notes = order_notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        self.authorization = None;
        self.receipt = None;
        self.step = CheckoutStep::Payment;
        Ok(())
    }

    /// Record a fresh gateway authorization for the current total.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongStep`] unless at Payment.
    pub fn record_authorization(
        &mut self,
        authorization: PaymentAuthorization,
    ) -> Result<(), FlowError> {
        self.require_step(CheckoutStep::Payment)?;
        self.authorization = Some(authorization);
        Ok(())
    }

    /// Record a successful payment and advance to Review.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::WrongStep`] unless at Payment and
    /// [`FlowError::NotAuthorized`] if no authorization was recorded.
    pub fn record_payment(&mut self, receipt: PaymentReceipt) -> Result<(), FlowError> {
        self.require_step(CheckoutStep::Payment)?;
        if self.authorization.is_none() {
            return Err(FlowError::NotAuthorized);
        }
        self.receipt = Some(receipt);
        self.step = CheckoutStep::Review;
        Ok(())
    }

    /// Step back by one. Backing past Payment drops the authorization and
    /// receipt; addresses or totals are about to change, so a new
    /// authorization is requested on re-entry.
    pub fn back(&mut self) {
        self.step = self.step.back();
        if self.step <= CheckoutStep::Billing {
            self.authorization = None;
            self.receipt = None;
        }
    }
}
