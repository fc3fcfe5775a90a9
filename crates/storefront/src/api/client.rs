//! DummyJSON API client implementation.
//!
//! Uses `reqwest` for HTTP and caches catalog reads using `moka` (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};
use url::Url;

use dummymart_core::ProductId;

use super::ApiError;
use super::cache::{CacheKey, CacheValue};
use super::types::{
    CreatedUser, ErrorBody, LoginRequest, LoginResponse, NewUser, Product, ProductListResponse,
};
use crate::catalog::{CatalogSource, Page};
use crate::config::ApiConfig;

/// Request timeout for every API call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

// =============================================================================
// DummyJsonClient
// =============================================================================

/// Client for the DummyJSON REST API.
///
/// Cheap to clone; clones share the HTTP connection pool and the cache.
/// Catalog reads are cached for 5 minutes, auth calls are never cached.
#[derive(Clone)]
pub struct DummyJsonClient {
    inner: Arc<DummyJsonClientInner>,
}

struct DummyJsonClientInner {
    client: reqwest::Client,
    base_url: Url,
    cache: Cache<CacheKey, CacheValue>,
}

impl DummyJsonClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("dummymart/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            inner: Arc::new(DummyJsonClientInner {
                client,
                base_url: config.base_url.clone(),
                cache,
            }),
        })
    }

    /// Resolve a path against the configured base URL.
    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.inner.base_url.join(path)?)
    }

    /// Send a request and decode a JSON response.
    async fn execute<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        // Body as text first for better error diagnostics
        let response_text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(error_message(&response_text)));
        }

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&response_text),
            });
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, ApiError> {
        self.execute(self.inner.client.get(url)).await
    }

    async fn post_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        url: Url,
        body: &B,
    ) -> Result<T, ApiError> {
        self.execute(self.inner.client.post(url).json(body)).await
    }

    // =========================================================================
    // Product Methods
    // =========================================================================

    /// Get one page of the catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn get_products(
        &self,
        limit: u32,
        skip: u32,
    ) -> Result<ProductListResponse, ApiError> {
        let cache_key = CacheKey::Products { limit, skip };

        if let Some(CacheValue::Products(listing)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(listing);
        }

        let mut url = self.endpoint("products")?;
        url.query_pairs_mut()
            .append_pair("limit", &limit.to_string())
            .append_pair("skip", &skip.to_string());

        let listing: ProductListResponse = self.get_json(url).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(listing.clone()))
            .await;

        Ok(listing)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: ProductId) -> Result<Product, ApiError> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let url = self.endpoint(&format!("products/{id}"))?;
        let product: Product = self
            .get_json(url)
            .await
            .map_err(|e| match e {
                ApiError::NotFound(_) => ApiError::NotFound(format!("Product not found: {id}")),
                other => other,
            })?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Get every product in a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(category = %category))]
    pub async fn get_products_by_category(
        &self,
        category: &str,
    ) -> Result<ProductListResponse, ApiError> {
        let cache_key = CacheKey::Category(category.to_string());

        if let Some(CacheValue::Products(listing)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for category");
            return Ok(listing);
        }

        let url = self.endpoint(&format!(
            "products/category/{}",
            urlencoding::encode(category)
        ))?;
        let listing: ProductListResponse = self.get_json(url).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(listing.clone()))
            .await;

        Ok(listing)
    }

    // =========================================================================
    // Auth Methods
    // =========================================================================

    /// Exchange a username and password for an access token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Status`] with 400/401 when the credentials are
    /// rejected, or another error if the request fails.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: &LoginRequest<'_>) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint("auth/login")?;
        self.post_json(url, request).await
    }

    /// Create a user account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the record or the request fails.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn add_user(&self, user: &NewUser<'_>) -> Result<CreatedUser, ApiError> {
        let url = self.endpoint("users/add")?;
        self.post_json(url, user).await
    }
}

#[async_trait]
impl CatalogSource for DummyJsonClient {
    async fn fetch_page(&self, limit: u32, skip: u32) -> Result<Page, ApiError> {
        let listing = self.get_products(limit, skip).await?;
        Ok(Page::from_listing(listing, skip, limit))
    }
}

/// Extract the `message` field of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body).map_or_else(
        |_| body.chars().take(200).collect(),
        |parsed| parsed.message,
    )
}
