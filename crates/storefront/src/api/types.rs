//! Wire types for the DummyJSON API.
//!
//! Field names follow the API's camelCase JSON. Prices and discounts arrive as
//! JSON floats and are converted to [`Decimal`] on deserialization.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use dummymart_core::{Email, Price, ProductId, UserId};

// =============================================================================
// Catalog
// =============================================================================

/// A product snapshot as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(default, with = "rust_decimal::serde::float")]
    pub discount_percentage: Decimal,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub stock: u32,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    /// Reviews, specs and policies shown on the details page.
    #[serde(flatten)]
    pub info: ProductInfo,
}

impl Product {
    /// Unit price in US dollars.
    #[must_use]
    pub const fn unit_price(&self) -> Price {
        Price::usd(self.price)
    }

    /// Whether any units are available.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

/// Details-page fields of a [`Product`]. Every field is optional on the
/// wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProductInfo {
    pub reviews: Vec<Review>,
    pub dimensions: Option<Dimensions>,
    /// Weight in grams.
    pub weight: Option<f64>,
    pub warranty_information: Option<String>,
    pub shipping_information: Option<String>,
    pub availability_status: Option<String>,
    pub return_policy: Option<String>,
    pub minimum_order_quantity: Option<u32>,
}

/// Package size in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
    pub depth: f64,
}

/// A customer review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Review {
    pub rating: u8,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewer_email: Option<String>,
}

/// One listing response (`GET /products`, `GET /products/category/:name`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductListResponse {
    pub products: Vec<Product>,
    #[serde(default)]
    pub total: u32,
    #[serde(default)]
    pub skip: u32,
    #[serde(default)]
    pub limit: u32,
}

// =============================================================================
// Auth & Users
// =============================================================================

/// Login request body (`POST /auth/login`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub expires_in_mins: u32,
}

/// Successful login response.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub email: Option<Email>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    pub access_token: String,
}

impl std::fmt::Debug for LoginResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResponse")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Account creation body (`POST /users/add`).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser<'a> {
    pub first_name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

/// The record echoed back by `POST /users/add`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedUser {
    pub id: UserId,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub email: Option<Email>,
}

/// Error body returned with non-success statuses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub message: String,
}
