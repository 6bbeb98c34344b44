//! Request-facing error taxonomy.
//!
//! Every denial produced by the edge layer maps onto one of these variants.
//! Messages are stable and minimal: they never carry map contents, directory
//! details or stack traces.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers by the edge security layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EdgeError {
    /// No identity was attached to the request.
    #[error("authentication required")]
    Unauthenticated,

    /// An identity is present but access was denied.
    #[error("{0}")]
    Forbidden(&'static str),

    /// Transient denial; the caller may retry after the hint.
    #[error("rate limit exceeded")]
    RateLimited { retry_after: Duration },

    /// Caller error, e.g. an unrecognised action name.
    #[error("{0}")]
    Misconfigured(String),
}

impl EdgeError {
    /// The HTTP status this error maps onto.
    pub fn status(&self) -> StatusCode {
        match self {
            EdgeError::Unauthenticated => StatusCode::UNAUTHORIZED,
            EdgeError::Forbidden(_) => StatusCode::FORBIDDEN,
            EdgeError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            EdgeError::Misconfigured(_) => StatusCode::BAD_REQUEST,
        }
    }
}

/// Whole seconds for a `Retry-After` header, never less than one.
pub fn retry_after_secs(retry_after: Duration) -> u64 {
    let secs = retry_after
        .as_secs()
        .saturating_add(u64::from(retry_after.subsec_nanos() > 0));
    secs.max(1)
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, Json(json!({ "error": self.to_string() }))).into_response();

        if let EdgeError::RateLimited { retry_after } = self {
            response.headers_mut().insert(
                header::RETRY_AFTER,
                HeaderValue::from(retry_after_secs(retry_after)),
            );
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_after_rounds_up() {
        assert_eq!(retry_after_secs(Duration::from_millis(10)), 1);
        assert_eq!(retry_after_secs(Duration::from_millis(1500)), 2);
        assert_eq!(retry_after_secs(Duration::from_secs(3)), 3);
        assert_eq!(retry_after_secs(Duration::ZERO), 1);
        assert_eq!(retry_after_secs(Duration::MAX), u64::MAX);
    }

    #[test]
    fn rate_limited_carries_retry_after_header() {
        let response = EdgeError::RateLimited {
            retry_after: Duration::from_millis(2500),
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers()[header::RETRY_AFTER], "3");
    }

    #[test]
    fn statuses_follow_taxonomy() {
        assert_eq!(EdgeError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(EdgeError::Forbidden("no").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            EdgeError::Misconfigured("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
    }
}
