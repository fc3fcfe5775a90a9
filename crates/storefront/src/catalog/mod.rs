//! Paginated product catalog view model.
//!
//! The remote catalog only paginates; it knows nothing about search text,
//! categories, price ranges or sorting. This module keeps the pages fetched so
//! far for the active [`FilterCriteria`], runs the filter/sort view over them,
//! and decides when another page is needed.
//!
//! - [`criteria`] - the search/category/price/sort selection
//! - [`view`] - pure filter and sort over fetched products
//! - [`pager`] - page sequence, in-flight tracking and fetch policy

pub mod criteria;
pub mod pager;
pub mod view;

pub use criteria::{FilterCriteria, PriceRange, SortKey};
pub use pager::{CatalogPager, FetchOutcome, Page, PageTicket};

use async_trait::async_trait;

use crate::api::ApiError;

/// Default number of products per page.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Default distance from the bottom of the list that triggers a fetch.
pub const DEFAULT_SCROLL_THRESHOLD: u32 = 300;

/// Categories offered by the DummyJSON catalog, in display order.
pub const KNOWN_CATEGORIES: &[&str] = &[
    "beauty",
    "fragrances",
    "furniture",
    "groceries",
    "home-decoration",
    "kitchen-accessories",
    "laptops",
    "mens-shirts",
    "mens-shoes",
    "mens-watches",
    "mobile-accessories",
    "motorcycle",
    "skin-care",
    "smartphones",
    "sports-accessories",
    "sunglasses",
    "tablets",
    "tops",
    "vehicle",
    "womens-bags",
    "womens-dresses",
    "womens-jewellery",
    "womens-shoes",
    "womens-watches",
];

/// A remote source of catalog pages.
///
/// Failures are returned as-is; the pager never retries on its own.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch `limit` products starting at offset `skip`.
    async fn fetch_page(&self, limit: u32, skip: u32) -> Result<Page, ApiError>;
}
