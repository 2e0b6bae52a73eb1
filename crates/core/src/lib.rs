//! Fungal Flux Core - Shared types library.
//!
//! This crate provides common types used across all Fungal Flux components:
//! - `storefront` - Public-facing e-commerce service
//! - `cli` - Command-line tools for seeding and inspection
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no session
//! state. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe ids, money, emails, order
//!   numbers, statuses, and product categories

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
