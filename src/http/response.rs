//! Response transformation.
//!
//! Integrations may contribute fixed headers; they are attached to every
//! response here, replacing any value a handler already set.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Headers added to every response, in integration order.
pub type ExtraHeaders = Arc<Vec<(HeaderName, HeaderValue)>>;

/// Middleware that sets the integration headers.
pub async fn apply_extra_headers(
    State(headers): State<ExtraHeaders>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    for (name, value) in headers.iter() {
        response.headers_mut().insert(name.clone(), value.clone());
    }
    response
}
