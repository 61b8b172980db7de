//! Request correlation ids.
//!
//! Every response carries `x-request-id`. An id supplied by the caller is
//! reused when it is short printable ASCII; anything else is replaced with a
//! fresh UUID v4. The id is recorded on the `http_request` span and tagged on
//! the Sentry scope.

use axum::{
    extract::Request,
    http::{HeaderMap, HeaderValue},
    middleware::Next,
    response::Response,
};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

const MAX_INCOMING_LEN: usize = 128;

/// The caller's id if usable, otherwise a new one.
fn resolve(headers: &HeaderMap) -> HeaderValue {
    headers
        .get(REQUEST_ID_HEADER)
        .filter(|value| {
            let bytes = value.as_bytes();
            !bytes.is_empty()
                && bytes.len() <= MAX_INCOMING_LEN
                && bytes.iter().all(u8::is_ascii_graphic)
        })
        .cloned()
        .unwrap_or_else(|| {
            // A hyphenated UUID is always a valid header value
            HeaderValue::from_str(&Uuid::new_v4().to_string()).unwrap_or(HeaderValue::from_static("unknown"))
        })
}

/// Attach a request id to the span, the Sentry scope and the response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let id = resolve(request.headers());
    let id_str = id.to_str().unwrap_or_default();

    Span::current().record("request_id", id_str);
    sentry::configure_scope(|scope| scope.set_tag("request_id", id_str));

    let mut response = next.run(request).await;
    response.headers_mut().insert(REQUEST_ID_HEADER, id);
    response
}
