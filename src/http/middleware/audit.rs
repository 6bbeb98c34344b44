//! Audit trail: one event per request on the `audit` target.

use std::time::Instant;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

use crate::auth::Identity;
use crate::observability::metrics;

pub async fn audit_log(request: Request<Body>, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let username = Identity::from_extensions(request.extensions())
        .map(|identity| identity.username)
        .unwrap_or_else(|_| "-".to_string());

    let response = next.run(request).await;
    let status = response.status();

    tracing::info!(
        target: "audit",
        request_id = %request_id,
        method = %method,
        path = %path,
        user = %username,
        status = status.as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request"
    );
    metrics::record_request(method.as_str(), status.as_u16());

    response
}
