//! Storefront notifications delivered through the relay.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{Value, json};

use binder_integration_tests::{RecordingMailer, checkout_body, fill_cart, spawn_relay, spawn_storefront};
use binder_storefront::storage::MemoryStore;

#[tokio::test]
async fn test_checkout_confirmation_goes_through_relay() {
    let mailer = RecordingMailer::default();
    let relay = spawn_relay(mailer.clone(), &[]).await;
    let base = spawn_storefront(Arc::new(MemoryStore::new()), Some(&relay)).await;
    let client = reqwest::Client::new();

    fill_cart(&client, &base, 1).await;
    let placed: Value = client
        .post(format!("{base}/api/checkout"))
        .json(&checkout_body("completed"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(placed["confirmationSent"], true);
    let order_id = placed["order"]["id"].as_str().unwrap().to_owned();

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "misty@cerulean.gym");
    assert_eq!(sent[0].subject, format!("Order Confirmation - {order_id}"));
    assert!(sent[0].html.contains("Misty"));

    // Nothing lands in the simulated outbox in relay mode
    let outbox: Value = client
        .get(format!("{base}/api/email/outbox"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(outbox.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_relay_failure_does_not_block_orders() {
    let mailer = RecordingMailer::default();
    mailer.set_failing(true);
    let relay = spawn_relay(mailer.clone(), &[]).await;
    let base = spawn_storefront(Arc::new(MemoryStore::new()), Some(&relay)).await;
    let client = reqwest::Client::new();

    fill_cart(&client, &base, 1).await;
    let response = client
        .post(format!("{base}/api/checkout"))
        .json(&checkout_body("completed"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let placed: Value = response.json().await.unwrap();
    assert_eq!(placed["confirmationSent"], false);
    let order_id = placed["order"]["id"].as_str().unwrap().to_owned();

    let response = client
        .post(format!("{base}/api/orders/{order_id}/status"))
        .json(&json!({"status": "shipped", "note": "Tracking 1Z999"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = client
        .post(format!("{base}/api/orders/{order_id}/status"))
        .json(&json!({"status": "processing"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let update: Value = response.json().await.unwrap();
    assert_eq!(update["order"]["status"], "processing");
    assert_eq!(update["emailSent"], false);
    assert!(update["emailError"].as_str().unwrap().contains("Failed to send email"));

    mailer.set_failing(false);
    let update: Value = client
        .post(format!("{base}/api/orders/{order_id}/status"))
        .json(&json!({"status": "shipped", "note": "Tracking 1Z999"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(update["emailSent"], true);
    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("Tracking 1Z999"));
}
