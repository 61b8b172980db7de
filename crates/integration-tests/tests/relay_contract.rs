//! The relay's HTTP contract over a real socket.

#![allow(clippy::unwrap_used)]

use reqwest::StatusCode;
use serde_json::{Value, json};

use binder_integration_tests::{RecordingMailer, spawn_relay};

fn message() -> Value {
    json!({
        "to": "erika@celadon.gym",
        "subject": "Your order shipped",
        "htmlContent": "<p>On its way</p>",
        "textContent": "On its way"
    })
}

#[tokio::test]
async fn test_health_reports_provider() {
    let base = spawn_relay(RecordingMailer::default(), &[]).await;
    let body: Value = reqwest::get(format!("{base}/api/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["emailProvider"], "sendgrid");
}

#[tokio::test]
async fn test_send_email_forwards_message() {
    let mailer = RecordingMailer::default();
    let base = spawn_relay(mailer.clone(), &[]).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/send-email"))
        .json(&message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({"success": true, "messageId": "recorded-1"}));

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to.as_str(), "erika@celadon.gym");
    assert_eq!(sent[0].text.as_deref(), Some("On its way"));
}

#[tokio::test]
async fn test_validation_errors() {
    let mailer = RecordingMailer::default();
    let base = spawn_relay(mailer.clone(), &[]).await;
    let client = reqwest::Client::new();

    let mut missing = message();
    missing["subject"] = json!("   ");
    let response = client
        .post(format!("{base}/api/send-email"))
        .json(&missing)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Missing required fields: to, subject, htmlContent");

    let mut invalid = message();
    invalid["to"] = json!("erika at celadon");
    let response = client
        .post(format!("{base}/api/send-email"))
        .json(&invalid)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Invalid email address");

    assert!(mailer.sent().is_empty());
}

#[tokio::test]
async fn test_provider_failure_is_reported() {
    let mailer = RecordingMailer::default();
    mailer.set_failing(true);
    let base = spawn_relay(mailer, &[]).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/send-email"))
        .json(&message())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Failed to send email");
    assert!(body["details"].as_str().unwrap().contains("401"));
}

#[tokio::test]
async fn test_rate_limit_per_client() {
    let base = spawn_relay(RecordingMailer::default(), &[]).await;
    let client = reqwest::Client::new();

    // Peer address is 127.0.0.1 for every request here
    for _ in 0..10 {
        let response = client.get(format!("{base}/api/health")).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = client.get(format!("{base}/api/health")).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_forwarded_for_does_not_reset_budget() {
    let base = spawn_relay(RecordingMailer::default(), &[]).await;
    let client = reqwest::Client::new();

    for n in 0..10 {
        let response = client
            .get(format!("{base}/api/health"))
            .header("x-forwarded-for", format!("203.0.113.{n}"))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
    let response = client
        .get(format!("{base}/api/health"))
        .header("x-forwarded-for", "203.0.113.200")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
}

#[tokio::test]
async fn test_test_email_only_in_development() {
    let client = reqwest::Client::new();

    let production = spawn_relay(RecordingMailer::default(), &[]).await;
    let response = client
        .post(format!("{production}/api/test-email"))
        .json(&json!({"to": "erika@celadon.gym"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let mailer = RecordingMailer::default();
    let development = spawn_relay(mailer.clone(), &[("RELAY_ENV", "development")]).await;
    let response = client
        .post(format!("{development}/api/test-email"))
        .json(&json!({"to": "erika@celadon.gym"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let sent = mailer.sent();
    assert_eq!(sent.len(), 1);
    assert!(sent[0].html.contains("sendgrid"));
}
