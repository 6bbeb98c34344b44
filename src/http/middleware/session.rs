//! Attach the upstream-verified session to the request.

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};

use crate::http::server::EdgeState;

/// Never rejects: handlers that need an identity reject through the
/// `Identity` extractor.
pub async fn attach_session(
    State(state): State<EdgeState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    if let Some(verifier) = &state.sessions {
        if let Some(context) = verifier.verify(request.headers()) {
            request.extensions_mut().insert(context);
        }
    }
    next.run(request).await
}
