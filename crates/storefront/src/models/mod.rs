//! Domain models shared across handlers.

pub mod address;
pub mod session;

pub use address::{Address, AddressForm, FieldErrors};
