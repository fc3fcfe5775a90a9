//! DummyMart Core - Shared types library.
//!
//! This crate provides common types used across all DummyMart components:
//! - `storefront` - Catalog, cart, session and notification logic
//! - `cli` - Interactive terminal storefront
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients, no storage. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, emails and
//!   account credentials

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
