//! Integration tests for DummyMart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p dummymart-integration-tests
//! ```
//!
//! Tests drive a real [`Storefront`] against [`FakeApi`], an in-process
//! stand-in for the DummyJSON API and the contact relay served by axum on an
//! ephemeral port. Storage lives in a temporary directory.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path as UrlPath, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use url::Url;

use dummymart_core::ProductId;
use dummymart_storefront::api::{Dimensions, Product, ProductInfo, Review};
use dummymart_storefront::config::StorefrontConfig;
use dummymart_storefront::error::AppError;
use dummymart_storefront::services::{CartNotifier, CartSnapshot, MailError};
use dummymart_storefront::state::Storefront;
use dummymart_storefront::storage::LocalStorage;

/// Page size used when a request omits `limit`.
const DEFAULT_LIMIT: usize = 30;

// =============================================================================
// Fixtures
// =============================================================================

/// An account the fake API accepts.
#[derive(Debug, Clone)]
pub struct FakeUser {
    pub id: i32,
    pub username: String,
    pub password: String,
    pub email: Option<String>,
    pub first_name: String,
}

impl FakeUser {
    #[must_use]
    pub fn new(id: i32, username: &str, password: &str) -> Self {
        Self {
            id,
            username: username.to_string(),
            password: password.to_string(),
            email: Some(format!("{username}@example.com")),
            first_name: username.to_string(),
        }
    }
}

/// `count` products with IDs `1..=count`, priced at their ID in dollars,
/// with ten units of stock each. `category` picks each product's category.
/// Product `id` carries `id % 3` reviews and a 10 x 20 x `id` mm box.
pub fn catalog(count: i32, category: impl Fn(i32) -> &'static str) -> Vec<Product> {
    (1..=count)
        .map(|id| Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            description: format!("Description of product {id}"),
            category: category(id).to_string(),
            price: Decimal::from(id),
            discount_percentage: Decimal::ZERO,
            rating: f64::from(id % 5) + 0.5,
            stock: 10,
            brand: None,
            thumbnail: None,
            images: vec![format!("https://cdn.example.com/{id}.png")],
            info: ProductInfo {
                reviews: (1..=id % 3).map(|n| review(id, n)).collect(),
                dimensions: Some(Dimensions {
                    width: 10.0,
                    height: 20.0,
                    depth: f64::from(id),
                }),
                weight: Some(f64::from(id * 100)),
                return_policy: Some("30 days return policy".to_string()),
                shipping_information: Some("Ships in 1 week".to_string()),
                minimum_order_quantity: Some(1),
                ..ProductInfo::default()
            },
        })
        .collect()
}

fn review(product: i32, n: i32) -> Review {
    Review {
        rating: 5,
        comment: format!("Review {n} of product {product}"),
        date: None,
        reviewer_name: format!("Reviewer {n}"),
        reviewer_email: None,
    }
}

// =============================================================================
// Fake API
// =============================================================================

#[derive(Default)]
struct FakeState {
    products: Vec<Product>,
    users: Vec<FakeUser>,
    contact_success: AtomicBool,
    listing_requests: AtomicUsize,
    contacts: Mutex<Vec<Value>>,
}

/// Running fake of the DummyJSON API plus `POST /contact`.
pub struct FakeApi {
    base_url: Url,
    state: Arc<FakeState>,
}

impl FakeApi {
    /// Serve `products` and accept logins from `users`.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start(products: Vec<Product>, users: Vec<FakeUser>) -> Self {
        let state = Arc::new(FakeState {
            products,
            users,
            contact_success: AtomicBool::new(true),
            ..FakeState::default()
        });

        let app = Router::new()
            .route("/products", get(list_products))
            .route("/products/{id}", get(product_by_id))
            .route("/products/category/{name}", get(products_by_category))
            .route("/auth/login", post(login))
            .route("/users/add", post(add_user))
            .route("/contact", post(contact))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .unwrap_or_else(|e| panic!("bind fake api: {e}"));
        let addr: SocketAddr = listener
            .local_addr()
            .unwrap_or_else(|e| panic!("fake api address: {e}"));
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                panic!("fake api stopped: {e}");
            }
        });

        let base_url = Url::parse(&format!("http://{addr}/"))
            .unwrap_or_else(|e| panic!("fake api url: {e}"));
        Self { base_url, state }
    }

    #[must_use]
    pub const fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Number of `GET /products` requests served.
    #[must_use]
    pub fn listing_requests(&self) -> usize {
        self.state.listing_requests.load(Ordering::SeqCst)
    }

    /// Bodies posted to `/contact`, oldest first.
    #[must_use]
    pub fn contacts(&self) -> Vec<Value> {
        self.state
            .contacts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Make `/contact` answer `{"success": false}`.
    pub fn reject_contacts(&self) {
        self.state.contact_success.store(false, Ordering::SeqCst);
    }

    /// Storefront configuration pointing at this fake.
    #[must_use]
    pub fn config(&self, storage_path: &Path) -> StorefrontConfig {
        let mut config = StorefrontConfig::new(self.base_url.clone(), self.base_url.clone());
        config.storage_path = storage_path.to_path_buf();
        config
    }

    /// A storefront using this fake, storage at `storage_path`, and
    /// `notifier` for abandoned-cart notifications.
    ///
    /// # Errors
    ///
    /// Returns the storefront construction error.
    pub fn storefront(
        &self,
        config: StorefrontConfig,
        notifier: Arc<dyn CartNotifier>,
    ) -> Result<Storefront, AppError> {
        let storage = LocalStorage::open(config.storage_path.clone())?;
        Storefront::with_parts(config, storage, notifier)
    }
}

#[derive(Deserialize)]
struct PageQuery {
    limit: Option<usize>,
    skip: Option<usize>,
}

fn not_found(message: String) -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "message": message })))
}

async fn list_products(
    State(state): State<Arc<FakeState>>,
    Query(page): Query<PageQuery>,
) -> Json<Value> {
    state.listing_requests.fetch_add(1, Ordering::SeqCst);

    let skip = page.skip.unwrap_or(0);
    let limit = page.limit.unwrap_or(DEFAULT_LIMIT);
    let products: Vec<&Product> = state.products.iter().skip(skip).take(limit).collect();

    Json(json!({
        "products": products,
        "total": state.products.len(),
        "skip": skip,
        "limit": limit,
    }))
}

async fn product_by_id(
    State(state): State<Arc<FakeState>>,
    UrlPath(id): UrlPath<i32>,
) -> Result<Json<Product>, (StatusCode, Json<Value>)> {
    state
        .products
        .iter()
        .find(|product| product.id.as_i32() == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| not_found(format!("Product with id '{id}' not found")))
}

async fn products_by_category(
    State(state): State<Arc<FakeState>>,
    UrlPath(name): UrlPath<String>,
) -> Json<Value> {
    let products: Vec<&Product> = state
        .products
        .iter()
        .filter(|product| product.category == name)
        .collect();

    Json(json!({
        "products": products,
        "total": products.len(),
        "skip": 0,
        "limit": products.len(),
    }))
}

#[derive(Deserialize)]
struct LoginBody {
    username: String,
    password: String,
}

async fn login(
    State(state): State<Arc<FakeState>>,
    Json(body): Json<LoginBody>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let user = state
        .users
        .iter()
        .find(|user| user.username == body.username && user.password == body.password)
        .ok_or_else(|| {
            (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Invalid credentials" })),
            )
        })?;

    Ok(Json(json!({
        "id": user.id,
        "username": user.username,
        "email": user.email,
        "firstName": user.first_name,
        "lastName": "Tester",
        "accessToken": format!("token-{}", user.id),
        "refreshToken": format!("refresh-{}", user.id),
    })))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NewUserBody {
    first_name: String,
    email: String,
}

async fn add_user(Json(body): Json<NewUserBody>) -> Json<Value> {
    Json(json!({
        "id": 209,
        "firstName": body.first_name,
        "email": body.email,
    }))
}

async fn contact(State(state): State<Arc<FakeState>>, Json(body): Json<Value>) -> Json<Value> {
    state
        .contacts
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .push(body);

    if state.contact_success.load(Ordering::SeqCst) {
        Json(json!({ "success": true }))
    } else {
        Json(json!({ "success": false, "message": "Mailbox unavailable" }))
    }
}

// =============================================================================
// Notifier
// =============================================================================

/// Records every notification instead of sending it.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<CartSnapshot>>,
}

impl RecordingNotifier {
    #[must_use]
    pub fn sent(&self) -> Vec<CartSnapshot> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl CartNotifier for RecordingNotifier {
    async fn notify(&self, snapshot: CartSnapshot) -> Result<(), MailError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot);
        Ok(())
    }
}

/// Poll `condition` every 10 ms until it holds or `timeout` elapses.
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
