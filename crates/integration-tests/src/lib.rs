//! Integration tests for the Binder TCG storefront and email relay.
//!
//! Both services are started in-process on ephemeral ports and driven over
//! real HTTP with reqwest. The relay runs with a [`RecordingMailer`] so no
//! message leaves the machine.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p binder-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `checkout_flow` - cart, checkout and order lifecycle against the storefront
//! - `relay_contract` - the relay's request/response contract and rate limit
//! - `storefront_relay` - storefront notifications delivered through the relay

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tokio::net::TcpListener;

use binder_core::EmailProvider;
use binder_relay::config::RelayConfig;
use binder_relay::mailer::{Mailer, MailerError, OutgoingEmail};
use binder_storefront::config::StorefrontConfig;
use binder_storefront::storage::SharedStore;

/// Mailer that keeps every message instead of delivering it.
#[derive(Clone, Default)]
pub struct RecordingMailer {
    sent: Arc<Mutex<Vec<OutgoingEmail>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingMailer {
    /// Messages accepted so far.
    #[must_use]
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Make every following send fail (or succeed again).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl Mailer for RecordingMailer {
    fn provider(&self) -> EmailProvider {
        EmailProvider::Sendgrid
    }

    async fn send(&self, email: &OutgoingEmail) -> Result<String, MailerError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(MailerError::SendGrid {
                status: 401,
                message: "The provided authorization grant is invalid".to_string(),
            });
        }
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        sent.push(email.clone());
        Ok(format!("recorded-{}", sent.len()))
    }
}

async fn serve(app: axum::Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("Listener has no address");
    tokio::spawn(async move {
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .expect("Test server error");
    });
    format!("http://{addr}")
}

/// Start a relay backed by `mailer`. `vars` override the relay environment
/// (a `SendGrid` key is always provided).
pub async fn spawn_relay(mailer: RecordingMailer, vars: &[(&str, &str)]) -> String {
    let config = RelayConfig::from_lookup(|key| {
        vars.iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| (*v).to_string())
            .or_else(|| match key {
                "EMAIL_PROVIDER" => Some("sendgrid".to_string()),
                "SENDGRID_API_KEY" => Some("SG.integration-9f2k".to_string()),
                _ => None,
            })
    })
    .expect("Invalid relay test configuration");

    serve(binder_relay::app(binder_relay::state::AppState::new(config, mailer))).await
}

/// Start a storefront on `store`, optionally delivering email through the
/// relay at `relay_url`.
pub async fn spawn_storefront(store: SharedStore, relay_url: Option<&str>) -> String {
    let config = StorefrontConfig::from_lookup(|key| match key {
        "RELAY_URL" => relay_url.map(str::to_owned),
        _ => None,
    })
    .expect("Invalid storefront test configuration");
    let state = binder_storefront::state::AppState::new(config, store).expect("Failed to open shop");

    serve(binder_storefront::app(state)).await
}

/// A checkout body for Misty, paid in full.
#[must_use]
pub fn checkout_body(payment_status: &str) -> Value {
    json!({
        "customer": {"name": "Misty", "email": "misty@cerulean.gym", "phone": "555-0102"},
        "shippingAddress": {
            "line1": "Cerulean Gym", "city": "Cerulean", "state": "KT",
            "postalCode": "00004", "country": "Kanto"
        },
        "payment": {"paymentId": "PAYID-INT-1", "status": payment_status}
    })
}

/// Put `quantity` of the first listed product in the cart; returns its id.
///
/// # Panics
///
/// Panics if the storefront is unreachable or has no products.
pub async fn fill_cart(client: &reqwest::Client, base: &str, quantity: u32) -> String {
    let products: Value = client
        .get(format!("{base}/api/products"))
        .send()
        .await
        .expect("products request")
        .json()
        .await
        .expect("products body");
    let id = products[0]["id"].as_str().expect("product id").to_owned();

    let response = client
        .post(format!("{base}/api/cart/items"))
        .json(&json!({"productId": id, "quantity": quantity}))
        .send()
        .await
        .expect("cart request");
    assert!(response.status().is_success(), "add to cart failed: {}", response.status());
    id
}
