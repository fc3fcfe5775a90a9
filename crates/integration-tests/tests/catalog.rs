//! Catalog browsing against the fake API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use dummymart_core::ProductId;
use dummymart_integration_tests::{FakeApi, RecordingNotifier, catalog};
use dummymart_storefront::catalog::{CatalogSource, FetchOutcome, FilterCriteria, SortKey};
use dummymart_storefront::error::AppError;

fn every_sixth_is_grocery(id: i32) -> &'static str {
    if id % 6 == 0 { "groceries" } else { "beauty" }
}

// =============================================================================
// Fill
// =============================================================================

#[tokio::test]
async fn test_first_fill_fetches_one_page() {
    let api = FakeApi::start(catalog(100, every_sixth_is_grocery), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    assert_eq!(store.fill_catalog().await.unwrap(), 1);
    assert_eq!(store.visible_products().len(), 20);
    assert!(store.pager().has_more());
    assert_eq!(api.listing_requests(), 1);
}

#[tokio::test]
async fn test_category_filter_keeps_fetching_until_source_is_exhausted() {
    let api = FakeApi::start(catalog(100, every_sixth_is_grocery), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();
    store.fill_catalog().await.unwrap();

    // Three of the first twenty are groceries; sixteen of all hundred.
    let groceries = FilterCriteria::default().with_category_toggled("groceries");
    assert!(store.set_criteria(groceries));
    store.fill_catalog().await.unwrap();

    let visible = store.visible_products();
    assert_eq!(visible.len(), 16);
    assert!(visible.iter().all(|p| p.category == "groceries"));
    assert!(!store.pager().has_more());
    // Page one is served from the client cache the second time round.
    assert_eq!(api.listing_requests(), 5);
}

#[tokio::test]
async fn test_filter_stops_once_a_page_is_visible() {
    let api = FakeApi::start(catalog(100, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    store.set_criteria(FilterCriteria::default().with_sort(Some(SortKey::PriceDesc)));
    store.fill_catalog().await.unwrap();

    let prices: Vec<_> = store.visible_products().iter().map(|p| p.price).collect();
    assert_eq!(prices.len(), 20);
    assert!(prices.windows(2).all(|w| w[0] >= w[1]));
    assert_eq!(api.listing_requests(), 1);
}

// =============================================================================
// Scroll
// =============================================================================

#[tokio::test]
async fn test_scroll_loads_next_page_once() {
    let api = FakeApi::start(catalog(45, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();
    store.fill_catalog().await.unwrap();

    assert!(store.on_scroll(1_000).is_none());
    let ticket = store.on_scroll(0).unwrap();
    assert_eq!(ticket.offset(), 20);
    assert!(store.on_scroll(0).is_none(), "second scroll while in flight");

    let result = store.api().fetch_page(ticket.limit(), ticket.offset()).await;
    let outcome = store.complete_fetch(ticket, result).unwrap();
    assert_eq!(outcome, FetchOutcome::Applied { added: 20 });

    let ticket = store.on_scroll(0).unwrap();
    let result = store.api().fetch_page(ticket.limit(), ticket.offset()).await;
    assert_eq!(
        store.complete_fetch(ticket, result).unwrap(),
        FetchOutcome::Applied { added: 5 }
    );
    assert_eq!(store.visible_products().len(), 45);
    assert!(store.on_scroll(0).is_none(), "catalog exhausted");
}

#[tokio::test]
async fn test_load_more_ignores_fill_rule() {
    let api = FakeApi::start(catalog(45, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();
    store.fill_catalog().await.unwrap();
    assert!(!store.pager().needs_fill());

    let outcome = store.load_more().await.unwrap();
    assert_eq!(outcome, Some(FetchOutcome::Applied { added: 20 }));
    assert_eq!(store.visible_products().len(), 40);
}

#[tokio::test]
async fn test_page_arriving_after_criteria_change_is_discarded() {
    let api = FakeApi::start(catalog(45, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    let ticket = store.fill_ticket().unwrap();
    store.set_criteria(FilterCriteria::default().with_search("product 4"));

    let result = store.api().fetch_page(ticket.limit(), ticket.offset()).await;
    assert_eq!(
        store.complete_fetch(ticket, result).unwrap(),
        FetchOutcome::Stale
    );
    assert!(store.visible_products().is_empty());
    assert!(store.pager().pages().is_empty());
}

// =============================================================================
// Details
// =============================================================================

#[tokio::test]
async fn test_product_details_and_related() {
    let api = FakeApi::start(catalog(100, every_sixth_is_grocery), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    let product = store.product(ProductId::new(12)).await.unwrap();
    assert_eq!(product.title, "Product 12");
    assert_eq!(product.images.len(), 1);
    assert!(product.info.reviews.is_empty());
    assert_eq!(product.info.dimensions.map(|d| d.depth), Some(12.0));
    assert_eq!(product.info.weight, Some(1200.0));
    assert_eq!(
        product.info.return_policy.as_deref(),
        Some("30 days return policy")
    );
    assert_eq!(product.info.minimum_order_quantity, Some(1));

    let reviewed = store.product(ProductId::new(14)).await.unwrap();
    let reviewers: Vec<&str> = reviewed
        .info
        .reviews
        .iter()
        .map(|review| review.reviewer_name.as_str())
        .collect();
    assert_eq!(reviewers, vec!["Reviewer 1", "Reviewer 2"]);
    assert_eq!(reviewed.info.reviews[1].comment, "Review 2 of product 14");

    let related = store.related(&product).await.unwrap();
    let ids: Vec<i32> = related.iter().map(|p| p.id.as_i32()).collect();
    assert_eq!(ids, vec![6, 18, 24, 30]);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let api = FakeApi::start(catalog(5, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    let err = store.product(ProductId::new(999)).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
    assert!(!err.is_internal());
}
