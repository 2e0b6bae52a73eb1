//! Request correlation ids.
//!
//! Every request gets an id: the upstream proxy's `x-request-id` when one
//! arrives, a fresh UUID otherwise. The id lands in the tracing span, on
//! the Sentry scope, and in the response headers so a shopper-reported
//! failure can be matched to its server-side trace.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Attach a correlation id to the request's span, Sentry scope, and
/// response.
pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = match request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
    {
        Some(upstream) => upstream.to_owned(),
        None => Uuid::new_v4().simple().to_string(),
    };

    tracing::Span::current().record("request_id", request_id.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id));

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}
