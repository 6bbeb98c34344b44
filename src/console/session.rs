//! Session collaborators: verification of inbound sessions and issuance at login.
//!
//! Both are implemented by the authentication service; the edge only
//! consumes their results.

use std::fmt;

use async_trait::async_trait;
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auth::SessionContext;

/// Verifies an inbound request's session (cookie, bearer token, ...).
pub trait SessionVerifier: Send + Sync {
    /// `None` when the request carries no valid session.
    fn verify(&self, headers: &HeaderMap) -> Option<SessionContext>;
}

/// Login request body.
#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Session handed back after a successful login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IssuedSession {
    pub token: String,
}

#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("session issuer unavailable: {0}")]
    Unavailable(String),
}

/// Exchanges credentials for a session.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    /// `Ok(None)` for rejected credentials.
    async fn issue(&self, credentials: &Credentials) -> Result<Option<IssuedSession>, IssuerError>;
}
