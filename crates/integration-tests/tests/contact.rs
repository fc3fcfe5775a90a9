//! Contact form submission through the relay.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use dummymart_integration_tests::{FakeApi, RecordingNotifier, catalog};
use dummymart_storefront::error::AppError;
use dummymart_storefront::forms::ContactForm;

fn form() -> ContactForm {
    ContactForm {
        name: "Jane Doe".to_string(),
        email: "jane@example.com".to_string(),
        message: "Where is my order?".to_string(),
    }
}

#[tokio::test]
async fn test_contact_message_is_relayed() {
    let api = FakeApi::start(catalog(1, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    store.submit_contact(&form()).await.unwrap();

    let contacts = api.contacts();
    assert_eq!(contacts.len(), 1);
    let body = contacts.first().unwrap();
    assert_eq!(body["name"], "Jane Doe");
    assert_eq!(body["email"], "jane@example.com");
    assert_eq!(body["message"], "Where is my order?");
}

#[tokio::test]
async fn test_relay_failure_is_reported() {
    let api = FakeApi::start(catalog(1, |_| "beauty"), Vec::new()).await;
    api.reject_contacts();
    let dir = tempfile::tempdir().unwrap();
    let store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    let err = store.submit_contact(&form()).await.unwrap_err();
    assert!(matches!(err, AppError::ContactRejected(Some(_))));
    assert_eq!(err.notice(), "Something went wrong. Please try again later.");
}

#[tokio::test]
async fn test_invalid_contact_is_not_sent() {
    let api = FakeApi::start(catalog(1, |_| "beauty"), Vec::new()).await;
    let dir = tempfile::tempdir().unwrap();
    let store = api
        .storefront(
            api.config(&dir.path().join("storage.json")),
            Arc::new(RecordingNotifier::default()),
        )
        .unwrap();

    let err = store
        .submit_contact(&ContactForm {
            email: "not-an-email".to_string(),
            ..form()
        })
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Validation(_)));
    assert!(api.contacts().is_empty());
}
