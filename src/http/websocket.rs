//! WebSocket upgrade detection and namespace stream sessions.
//!
//! # Data Flow
//! ```text
//! Client ──upgrade──→ connection_limit (slot) → namespace_stream (view check)
//!        ←──frames──→ run_stream (echo + keepalive), slot dropped on exit
//! ```
//!
//! # Design Decisions
//! - The connection slot moves into the upgraded task, so it lives exactly as
//!   long as the connection and is released on close, error or panic
//! - Ping/pong keepalive every 30 seconds

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Extension, MatchedPath, Path,
    },
    http::{header, Extensions, HeaderMap},
    response::Response,
};

use crate::auth::{Action, Identity};
use crate::error::EdgeError;
use crate::security::ConnectionSlot;

const KEEPALIVE: Duration = Duration::from_secs(30);

/// The only route whose upgrades are governed by the connection limiter.
pub const STREAM_ROUTE: &str = "/api/namespaces/{namespace}/stream";

/// True for `Connection: upgrade` + `Upgrade: websocket` requests.
pub fn is_websocket_upgrade(headers: &HeaderMap) -> bool {
    let connection_upgrade = headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(','))
        .any(|token| token.trim().eq_ignore_ascii_case("upgrade"));

    let upgrade_websocket = headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"));

    connection_upgrade && upgrade_websocket
}

/// An upgrade request routed to [`STREAM_ROUTE`]. Upgrade headers on any
/// other route do not count.
pub fn is_stream_upgrade(extensions: &Extensions, headers: &HeaderMap) -> bool {
    extensions
        .get::<MatchedPath>()
        .is_some_and(|path| path.as_str() == STREAM_ROUTE)
        && is_websocket_upgrade(headers)
}

/// `GET /api/namespaces/{namespace}/stream`
pub async fn namespace_stream(
    identity: Identity,
    Path(namespace): Path<String>,
    slot: Option<Extension<ConnectionSlot>>,
    ws: WebSocketUpgrade,
) -> Result<Response, EdgeError> {
    identity.authorize(&namespace, Action::View)?;

    let slot = slot.map(|Extension(slot)| slot);
    let username = identity.username;
    Ok(ws.on_upgrade(move |socket| run_stream(socket, namespace, username, slot)))
}

async fn run_stream(
    mut socket: WebSocket,
    namespace: String,
    username: String,
    slot: Option<ConnectionSlot>,
) {
    tracing::debug!(namespace = %namespace, user = %username, "Stream opened");

    let mut keepalive = tokio::time::interval_at(tokio::time::Instant::now() + KEEPALIVE, KEEPALIVE);
    loop {
        tokio::select! {
            message = socket.recv() => match message {
                Some(Ok(Message::Text(text))) => {
                    if socket.send(Message::Text(text)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Binary(data))) => {
                    if socket.send(Message::Binary(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::debug!(namespace = %namespace, error = %e, "Stream error");
                    break;
                }
            },
            _ = keepalive.tick() => {
                if socket.send(Message::Ping(Default::default())).await.is_err() {
                    break;
                }
            }
        }
    }

    drop(slot);
    tracing::debug!(namespace = %namespace, user = %username, "Stream closed");
}
