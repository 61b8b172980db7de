//! Rate limiting middleware using governor and `tower_governor`.
//!
//! The relay accepts 10 requests per 15 minutes per client IP on `/api/*`:
//! a burst of 10, with one token replenished every 90 seconds.

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, Request};
use governor::clock::QuantaInstant;
use governor::middleware::NoOpMiddleware;
use tower_governor::{GovernorError, GovernorLayer, governor::GovernorConfigBuilder};

/// Seconds between replenished tokens.
pub const REPLENISH_SECS: u64 = 90;
/// Requests allowed back to back.
pub const BURST_SIZE: u32 = 10;

// =============================================================================
// Client IP Key Extractor
// =============================================================================

/// Keys requests by the TCP peer address.
///
/// `X-Forwarded-For` and `X-Real-IP` are only honoured when the relay runs
/// behind a proxy that sets them (`TRUST_PROXY_HEADERS=true`). Otherwise a
/// client could pick a fresh key for every request.
#[derive(Clone, Copy, Default)]
pub struct ClientIpKeyExtractor {
    trust_proxy_headers: bool,
}

impl ClientIpKeyExtractor {
    /// Create an extractor; `trust_proxy_headers` enables the proxy headers.
    #[must_use]
    pub const fn new(trust_proxy_headers: bool) -> Self {
        Self { trust_proxy_headers }
    }

    fn from_headers(headers: &HeaderMap) -> Option<IpAddr> {
        // First IP in the X-Forwarded-For chain, then X-Real-IP
        headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| s.trim().parse::<IpAddr>().ok())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.trim().parse::<IpAddr>().ok())
            })
    }
}

impl tower_governor::key_extractor::KeyExtractor for ClientIpKeyExtractor {
    type Key = IpAddr;

    fn extract<T>(&self, req: &Request<T>) -> Result<Self::Key, GovernorError> {
        if self.trust_proxy_headers
            && let Some(ip) = Self::from_headers(req.headers())
        {
            return Ok(ip);
        }

        req.extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip())
            .ok_or(GovernorError::UnableToExtractKey)
    }
}

// =============================================================================
// Rate Limiter Configuration
// =============================================================================

/// Rate limiter layer type for Axum.
pub type RateLimiterLayer =
    GovernorLayer<ClientIpKeyExtractor, NoOpMiddleware<QuantaInstant>, axum::body::Body>;

/// Create the `/api` rate limiter: 10 requests per 15 minutes per IP.
///
/// Proxy headers pick the client IP only when `trust_proxy_headers` is set.
///
/// # Panics
///
/// This function will not panic. The configuration uses only valid positive
/// integers (`per_second(90)` and `burst_size(10)`), which are always accepted
/// by `GovernorConfigBuilder`.
#[must_use]
pub fn api_rate_limiter(trust_proxy_headers: bool) -> RateLimiterLayer {
    let config = GovernorConfigBuilder::default()
        .key_extractor(ClientIpKeyExtractor::new(trust_proxy_headers))
        .per_second(REPLENISH_SECS) // Replenish 1 token every 90 seconds
        .burst_size(BURST_SIZE) // 10 requests per 15-minute window
        .finish()
        .expect("rate limiter config with per_second(90) and burst_size(10) is valid");
    GovernorLayer::new(Arc::new(config))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tower_governor::key_extractor::KeyExtractor;

    use super::*;

    fn request(forwarded_for: Option<&str>, peer: Option<[u8; 4]>) -> Request<()> {
        let mut builder = Request::builder();
        if let Some(value) = forwarded_for {
            builder = builder.header("x-forwarded-for", value);
        }
        let mut req = builder.body(()).unwrap();
        if let Some(ip) = peer {
            req.extensions_mut()
                .insert(ConnectInfo(SocketAddr::from((ip, 5555))));
        }
        req
    }

    #[test]
    fn test_peer_address_by_default() {
        let req = request(Some("203.0.113.7"), Some([192, 0, 2, 1]));
        let ip = ClientIpKeyExtractor::default().extract(&req).unwrap();
        assert_eq!(ip.to_string(), "192.0.2.1");
    }

    #[test]
    fn test_trusted_forwarded_for_uses_first_hop() {
        let req = request(Some("203.0.113.7, 10.0.0.1"), Some([192, 0, 2, 1]));
        let ip = ClientIpKeyExtractor::new(true).extract(&req).unwrap();
        assert_eq!(ip.to_string(), "203.0.113.7");
    }

    #[test]
    fn test_trusted_real_ip_and_fallback() {
        let mut req = request(None, Some([192, 0, 2, 1]));
        let extractor = ClientIpKeyExtractor::new(true);
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "192.0.2.1");

        req.headers_mut()
            .insert("x-real-ip", "198.51.100.2".parse().unwrap());
        assert_eq!(extractor.extract(&req).unwrap().to_string(), "198.51.100.2");
    }

    #[test]
    fn test_no_source_is_an_error() {
        let req = request(Some("203.0.113.7"), None);
        assert!(ClientIpKeyExtractor::default().extract(&req).is_err());
    }
}
