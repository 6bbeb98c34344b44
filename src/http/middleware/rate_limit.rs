//! Per-IP rate limiting middleware for the API and login pools.

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
use crate::http::websocket::is_stream_upgrade;
use crate::observability::metrics;
use crate::security::{client_ip, Admission, RateLimiterPool};

/// General API pool. Upgrades on the stream route are governed by the
/// connection limiter instead and skip this pool.
pub async fn api_rate_limit(
    State(state): State<EdgeState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.rate_limit_enabled || is_stream_upgrade(request.extensions(), request.headers()) {
        return next.run(request).await;
    }
    enforce(&state, &state.rate_limits.api, addr, request, next).await
}

/// Stricter pool applied to the login route only.
pub async fn login_rate_limit(
    State(state): State<EdgeState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !state.rate_limit_enabled {
        return next.run(request).await;
    }
    enforce(&state, &state.rate_limits.login, addr, request, next).await
}

async fn enforce(
    state: &EdgeState,
    pool: &RateLimiterPool,
    addr: SocketAddr,
    request: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(request.headers(), addr.ip(), &state.trust);

    match pool.acquire(ip) {
        Admission::Allowed => next.run(request).await,
        Admission::Limited { retry_after } => {
            tracing::warn!(client_ip = %ip, pool = pool.name(), "Rate limit exceeded");
            metrics::record_rate_limited(pool.name());
            EdgeError::RateLimited { retry_after }.into_response()
        }
    }
}
