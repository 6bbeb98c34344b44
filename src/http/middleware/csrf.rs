//! Origin validation middleware for state-changing requests.

use std::net::SocketAddr;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::EdgeError;
use crate::http::server::EdgeState;
use crate::observability::metrics;
use crate::security::validate_request;

pub async fn origin_guard(
    State(state): State<EdgeState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authority = request.uri().authority().map(|a| a.as_str());
    let verdict = validate_request(
        request.method(),
        request.headers(),
        authority,
        Some(addr.ip()),
        &state.trust,
    );

    match verdict {
        Ok(()) => next.run(request).await,
        Err(rejection) => {
            let origin = request
                .headers()
                .get("origin")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("-");
            tracing::warn!(
                peer = %addr.ip(),
                method = %request.method(),
                origin = %origin,
                reason = rejection.as_str(),
                "Origin rejected"
            );
            metrics::record_origin_rejected(rejection.as_str());
            EdgeError::Forbidden("origin not allowed").into_response()
        }
    }
}
