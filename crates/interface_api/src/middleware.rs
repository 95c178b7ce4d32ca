//! API middleware

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};
use tracing::{info, warn};

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Access log for every API call.
///
/// Only the path is logged; query strings and bodies can carry claim text.
pub async fn audit_middleware(request: Request<Body>, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_owned();

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed_ms = started.elapsed().as_millis();
    let status = response.status().as_u16();

    if response.status().is_server_error() {
        warn!(%method, %path, %request_id, status, elapsed_ms, "API request failed");
    } else {
        info!(%method, %path, %request_id, status, elapsed_ms, "API request");
    }

    response
}
