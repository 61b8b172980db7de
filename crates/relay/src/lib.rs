//! Binder TCG email relay library.
//!
//! A small HTTP service that accepts `{to, subject, htmlContent}` from the
//! storefront and forwards it through Gmail, a generic SMTP server or the
//! `SendGrid` API. `/api/*` is rate limited per client IP.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod mailer;
pub mod rate_limit;
pub mod routes;
pub mod state;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::config::RelayConfig;
use crate::mailer::Mailer;
use crate::state::AppState;

/// CORS for the storefront origin, if `FRONTEND_URL` is configured.
fn cors_layer(config: &RelayConfig) -> Option<CorsLayer> {
    let origin = config.frontend_url.as_ref()?.origin().ascii_serialization();
    let origin = HeaderValue::from_str(&origin)
        .inspect_err(|e| tracing::warn!(error = %e, "FRONTEND_URL is not a valid origin, CORS disabled"))
        .ok()?;

    Some(
        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

/// Build the full relay router with rate limiting, CORS and tracing.
pub fn app<M: Mailer>(state: AppState<M>) -> Router {
    let limiter = rate_limit::api_rate_limiter(state.config().trust_proxy_headers);
    let api = routes::routes::<M>().layer(limiter);
    let router = Router::new().nest("/api", api);

    let router = match cors_layer(state.config()) {
        Some(cors) => router.layer(cors),
        None => router,
    };

    router
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>, latency: std::time::Duration, span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record("latency_ms", u64::try_from(latency.as_millis()).unwrap_or(u64::MAX));
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::net::SocketAddr;

    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::routes::tests::{RecordingMailer, config_with};

    fn send_request(peer: [u8; 4], forwarded_for: &str) -> Request<Body> {
        let mut req = Request::builder()
            .method("POST")
            .uri("/api/send-email")
            .header("content-type", "application/json")
            .header("x-forwarded-for", forwarded_for)
            .body(Body::from(
                r#"{"to":"erika@celadon.gym","subject":"Hi","htmlContent":"<p>Hi</p>"}"#,
            ))
            .unwrap();
        req.extensions_mut()
            .insert(ConnectInfo(SocketAddr::from((peer, 40_000))));
        req
    }

    #[tokio::test]
    async fn test_eleventh_request_is_rate_limited() {
        let app = app(AppState::new(config_with(&[]), RecordingMailer::default()));

        for _ in 0..rate_limit::BURST_SIZE {
            let response = app.clone().oneshot(send_request([198, 51, 100, 4], "10.0.0.1")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(send_request([198, 51, 100, 4], "10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // Other clients keep their own budget
        let response = app.oneshot(send_request([198, 51, 100, 5], "10.0.0.1")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_rotating_forwarded_for_shares_peer_budget() {
        let app = app(AppState::new(config_with(&[]), RecordingMailer::default()));

        for n in 0..rate_limit::BURST_SIZE {
            let response = app
                .clone()
                .oneshot(send_request([203, 0, 113, 1], &format!("10.1.0.{n}")))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.oneshot(send_request([203, 0, 113, 1], "10.1.0.99")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_trusted_proxy_keys_on_forwarded_for() {
        let config = config_with(&[("TRUST_PROXY_HEADERS", "true")]);
        let app = app(AppState::new(config, RecordingMailer::default()));

        for _ in 0..rate_limit::BURST_SIZE {
            let response = app.clone().oneshot(send_request([10, 0, 0, 2], "198.51.100.4")).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);
        }
        let response = app.clone().oneshot(send_request([10, 0, 0, 2], "198.51.100.4")).await.unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        // Same proxy, different client
        let response = app.oneshot(send_request([10, 0, 0, 2], "198.51.100.5")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_cors_allows_frontend_origin() {
        let config = config_with(&[("FRONTEND_URL", "https://shop.binder.example/checkout")]);
        let app = app(AppState::new(config, RecordingMailer::default()));

        let response = app
            .oneshot(
                Request::builder()
                    .method("OPTIONS")
                    .uri("/api/send-email")
                    .header("origin", "https://shop.binder.example")
                    .header("access-control-request-method", "POST")
                    .extension(ConnectInfo(SocketAddr::from(([198, 51, 100, 9], 40_000))))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(
            response.headers().get("access-control-allow-origin").unwrap(),
            "https://shop.binder.example"
        );
    }

    #[test]
    fn test_no_cors_without_frontend_url() {
        assert!(cors_layer(&config_with(&[])).is_none());
    }
}
