//! Concurrent WebSocket connection limiting.

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
use crate::security::client_ip;

/// Claim a connection slot for upgrades on the stream route and hand it to the handler
/// through the request extensions. The slot is released when the last holder
/// drops it: with the request if the upgrade never happens, otherwise when
/// the upgraded connection's task ends.
pub async fn connection_limit(
    State(state): State<EdgeState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if !is_stream_upgrade(request.extensions(), request.headers()) {
        return next.run(request).await;
    }

    let ip = client_ip(request.headers(), addr.ip(), &state.trust);
    match state.connections.try_acquire(ip) {
        Some(slot) => {
            request.extensions_mut().insert(slot);
            next.run(request).await
        }
        None => {
            tracing::warn!(
                client_ip = %ip,
                max_per_ip = state.connections.max_per_ip(),
                "WebSocket connection limit reached"
            );
            metrics::record_ws_rejected();
            EdgeError::RateLimited {
                retry_after: state.connection_retry_after,
            }
            .into_response()
        }
    }
}
