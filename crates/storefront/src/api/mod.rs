//! DummyJSON REST API client.
//!
//! # Architecture
//!
//! - Plain JSON over HTTPS with `reqwest`
//! - The remote API is the source of truth - nothing is synced locally
//! - In-memory caching via `moka` for catalog responses (5 minute TTL)
//!
//! # Endpoints
//!
//! - `GET /products?limit=L&skip=S` - one catalog page
//! - `GET /products/:id` - single product
//! - `GET /products/category/:name` - products in a category
//! - `POST /auth/login` - credential login
//! - `POST /users/add` - account creation
//!
//! # Example
//!
//! ```rust,ignore
//! use dummymart_storefront::api::DummyJsonClient;
//!
//! let client = DummyJsonClient::new(&config.api)?;
//! let listing = client.get_products(20, 0).await?;
//! let product = client.get_product(listing.products[0].id).await?;
//! ```

mod cache;
mod client;
pub mod types;

pub use client::DummyJsonClient;
pub use types::*;

use thiserror::Error;

/// Errors that can occur when interacting with the remote API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP request failed (connection, TLS, timeout).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API error: {status} - {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// An endpoint URL could not be built.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl ApiError {
    /// Whether the API rejected the request itself (400 or 401), as opposed to
    /// failing to answer it.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { status: 400 | 401, .. })
    }
}
