//! Cache types for catalog responses.

use dummymart_core::ProductId;

use crate::api::types::{Product, ProductListResponse};

/// Cache key for catalog lookups.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products { limit: u32, skip: u32 },
    Category(String),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(ProductListResponse),
}
