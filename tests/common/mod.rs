//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::extract::connect_info::MockConnectInfo;
use axum::http::{HeaderMap, Request, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceExt;

use console_edge::auth::SessionContext;
use console_edge::config::{ConsoleConfig, ConsoleData, ResourceEntry};
use console_edge::console::{
    Credentials, IssuedSession, IssuerError, SessionIssuer, SessionVerifier, StaticRepository,
};
use console_edge::http::{Collaborators, EdgeState};
use console_edge::{HttpServer, Shutdown};

pub const USER_HEADER: &str = "x-test-user";

/// Reads `username:role:ns=level,ns=level` from a test header.
pub struct HeaderSessions;

impl SessionVerifier for HeaderSessions {
    fn verify(&self, headers: &HeaderMap) -> Option<SessionContext> {
        let raw = headers.get(USER_HEADER)?.to_str().ok()?;
        let mut parts = raw.splitn(3, ':');
        let username = parts.next()?.to_string();
        let role = parts.next().unwrap_or("user").to_string();
        let permissions: HashMap<String, String> = parts
            .next()
            .unwrap_or_default()
            .split(',')
            .filter_map(|pair| pair.split_once('='))
            .map(|(ns, level)| (ns.to_string(), level.to_string()))
            .collect();

        Some(SessionContext::Raw {
            username,
            role,
            permissions,
        })
    }
}

/// Accepts `alice` / `secret`.
pub struct FixedIssuer;

#[async_trait]
impl SessionIssuer for FixedIssuer {
    async fn issue(&self, credentials: &Credentials) -> Result<Option<IssuedSession>, IssuerError> {
        if credentials.username == "alice" && credentials.password == "secret" {
            Ok(Some(IssuedSession {
                token: "token-alice".into(),
            }))
        } else {
            Ok(None)
        }
    }
}

pub fn console_data() -> ConsoleData {
    let entry = |kind: &str, name: &str, namespace: &str| ResourceEntry {
        kind: kind.into(),
        name: name.into(),
        namespace: namespace.into(),
    };
    ConsoleData {
        namespaces: vec!["dev".into(), "qa".into(), "prod".into()],
        resources: vec![
            entry("Pod", "api", "dev"),
            entry("Pod", "web", "qa"),
            entry("Pod", "db", "prod"),
            entry("Node", "node-1", ""),
        ],
    }
}

pub fn test_config() -> ConsoleConfig {
    let mut config = ConsoleConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.console = console_data();
    config
}

pub fn server(config: ConsoleConfig) -> HttpServer {
    let collaborators = Collaborators {
        repository: Arc::new(StaticRepository::new(&config.console)),
        sessions: Some(Arc::new(HeaderSessions)),
        issuer: Some(Arc::new(FixedIssuer)),
        ldap: None,
    };
    HttpServer::new(config, collaborators)
}

/// The server's router as seen from `peer`.
pub fn app(server: &HttpServer, peer: &str) -> Router {
    let addr: SocketAddr = peer.parse().unwrap();
    server.router().layer(MockConnectInfo(addr))
}

pub async fn send(app: &Router, request: Request<Body>) -> Response<Body> {
    app.clone().oneshot(request).await.unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Start a real server on an ephemeral port.
pub async fn spawn(server: HttpServer) -> (SocketAddr, Shutdown, EdgeState) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let edge = server.edge().clone();
    let shutdown = Shutdown::new();
    let signal = shutdown.subscribe();

    tokio::spawn(async move {
        let _ = server.run(listener, signal).await;
    });

    (addr, shutdown, edge)
}

/// Poll `check` until it holds or `timeout` elapses.
pub async fn eventually<F: Fn() -> bool>(timeout: Duration, check: F) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
