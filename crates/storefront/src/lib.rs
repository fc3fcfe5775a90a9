//! DummyMart storefront library.
//!
//! Catalog browsing with incremental loading, a per-session cart, login and
//! sign-up against the DummyJSON API, a contact form, and debounced
//! abandoned-cart emails. The UI layer drives a single [`state::Storefront`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod forms;
pub mod models;
pub mod scheduler;
pub mod services;
pub mod state;
pub mod storage;
pub mod theme;
