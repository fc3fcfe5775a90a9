//! Cart rules and abandoned-cart notifications end to end.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use dummymart_core::ProductId;
use dummymart_integration_tests::{FakeApi, FakeUser, RecordingNotifier, catalog, wait_until};
use dummymart_storefront::error::AppError;
use dummymart_storefront::forms::LoginForm;

const DELAY: Duration = Duration::from_millis(300);

async fn fake_api() -> FakeApi {
    FakeApi::start(
        catalog(10, |_| "beauty"),
        vec![FakeUser::new(1, "emilys", "emilyspass")],
    )
    .await
}

#[tokio::test]
async fn test_guest_cannot_add_to_cart() {
    let api = fake_api().await;
    let dir = tempfile::tempdir().unwrap();
    let recorder = Arc::new(RecordingNotifier::default());
    let mut store = api
        .storefront(api.config(&dir.path().join("storage.json")), recorder.clone())
        .unwrap();

    let product = store.product(ProductId::new(3)).await.unwrap();
    let err = store.set_cart_quantity(&product, 1).unwrap_err();

    assert!(matches!(err, AppError::LoginRequired));
    assert_eq!(err.notice(), "Please login to add items to cart.");
    assert!(store.cart().is_empty());
    assert!(!store.notification_pending());
}

#[tokio::test]
async fn test_rapid_mutations_send_one_notification_with_final_cart() {
    let api = fake_api().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = api.config(&dir.path().join("storage.json"));
    config.cart_notify_delay = DELAY;
    let recorder = Arc::new(RecordingNotifier::default());
    let mut store = api.storefront(config, recorder.clone()).unwrap();

    store
        .login(&LoginForm::new("emilys", "emilyspass"))
        .await
        .unwrap();
    let three = store.product(ProductId::new(3)).await.unwrap();
    let seven = store.product(ProductId::new(7)).await.unwrap();

    store.set_cart_quantity(&three, 2).unwrap();
    tokio::time::sleep(DELAY / 3).await;
    store.set_cart_quantity(&seven, 1).unwrap();
    store.increment(&seven).unwrap();

    assert!(wait_until(DELAY * 5, || !recorder.sent().is_empty()).await);
    tokio::time::sleep(DELAY).await;

    let sent = recorder.sent();
    assert_eq!(sent.len(), 1);
    let snapshot = sent.first().unwrap();
    assert_eq!(
        snapshot.quantity_summary(),
        "Product 3 - Qty: 2\nProduct 7 - Qty: 2"
    );
    assert_eq!(snapshot.total().to_string(), "$20.00");
    assert_eq!(
        snapshot.recipient.as_ref().map(|email| email.as_str()),
        Some("emilys@example.com")
    );
}

#[tokio::test]
async fn test_logout_cancels_pending_notification() {
    let api = fake_api().await;
    let dir = tempfile::tempdir().unwrap();
    let mut config = api.config(&dir.path().join("storage.json"));
    config.cart_notify_delay = DELAY;
    let recorder = Arc::new(RecordingNotifier::default());
    let mut store = api.storefront(config, recorder.clone()).unwrap();

    store
        .login(&LoginForm::new("emilys", "emilyspass"))
        .await
        .unwrap();
    let product = store.product(ProductId::new(1)).await.unwrap();
    store.set_cart_quantity(&product, 1).unwrap();
    assert!(store.notification_pending());

    store.logout().unwrap();
    assert!(store.cart().is_empty());

    tokio::time::sleep(DELAY * 3).await;
    assert!(recorder.sent().is_empty());
}

#[tokio::test]
async fn test_quantity_above_stock_is_refused() {
    let api = fake_api().await;
    let dir = tempfile::tempdir().unwrap();
    let mut store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();
    store
        .login(&LoginForm::new("emilys", "emilyspass"))
        .await
        .unwrap();

    let product = store.product(ProductId::new(4)).await.unwrap();
    store.set_cart_quantity(&product, 10).unwrap();
    let err = store.set_cart_quantity(&product, 11).unwrap_err();

    assert!(matches!(err, AppError::Cart(_)));
    assert_eq!(store.cart().quantity_of(product.id), 10);
    assert_eq!(store.increment(&product).unwrap(), 10);
}
