//! The checkout core: cart aggregation, order totals, the multi-step flow
//! state machine, submission locking, and order submission.
//!
//! Everything here is deterministic and I/O-free except [`submit`], which
//! drives the one atomic store call. Handlers in [`crate::routes`] wire
//! these pieces to the session and the remote clients.

pub mod cart;
pub mod flow;
pub mod guard;
pub mod pricing;
pub mod submit;

pub use cart::{Cart, CartError, CartLine};
pub use flow::{
    CheckoutForm, CheckoutState, CheckoutStep, FlowError, PaymentAuthorization, PaymentReceipt,
};
pub use guard::{SubmissionGuards, SubmissionPermit};
pub use pricing::OrderTotals;
pub use submit::{SubmitError, submit_order};
