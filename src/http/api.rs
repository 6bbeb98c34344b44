//! Console API handlers.
//!
//! Thin pass-throughs to the resource repository, filtered through the
//! caller's identity.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;

use crate::auth::{is_admin, Action, Identity, PermissionLevel, Role};
use crate::console::{Credentials, RepositoryError, Resource};
use crate::error::EdgeError;
use crate::http::server::AppState;

/// Handler error: an edge denial or a collaborator failure.
#[derive(Debug)]
pub enum ApiError {
    Edge(EdgeError),
    Upstream(RepositoryError),
    NotFound,
}

impl From<EdgeError> for ApiError {
    fn from(e: EdgeError) -> Self {
        ApiError::Edge(e)
    }
}

impl From<RepositoryError> for ApiError {
    fn from(e: RepositoryError) -> Self {
        ApiError::Upstream(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Edge(e) => e.into_response(),
            ApiError::Upstream(e) => {
                tracing::error!(error = %e, "Repository call failed");
                (
                    StatusCode::BAD_GATEWAY,
                    Json(json!({ "error": "upstream unavailable" })),
                )
                    .into_response()
            }
            ApiError::NotFound => {
                (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" }))).into_response()
            }
        }
    }
}

pub async fn healthz() -> &'static str {
    "ok"
}

/// `POST /api/auth/login`
pub async fn login(State(state): State<AppState>, Json(credentials): Json<Credentials>) -> Response {
    let Some(issuer) = &state.issuer else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "login unavailable" })),
        )
            .into_response();
    };

    match issuer.issue(&credentials).await {
        Ok(Some(session)) => {
            tracing::info!(user = %credentials.username, "Login succeeded");
            Json(session).into_response()
        }
        Ok(None) => {
            tracing::warn!(user = %credentials.username, "Login rejected");
            EdgeError::Unauthenticated.into_response()
        }
        Err(e) => {
            tracing::error!(error = %e, "Session issuer failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "login unavailable" })),
            )
                .into_response()
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub username: String,
    pub role: Role,
    pub admin: bool,
    pub namespaces: Vec<String>,
}

/// `GET /api/me`
pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Json<Profile>, ApiError> {
    let admin = is_admin(&identity, state.ldap.as_deref(), state.ldap_timeout).await;
    let namespaces = identity.filter_namespaces(state.repository.namespaces().await?);

    Ok(Json(Profile {
        username: identity.username,
        role: identity.role,
        admin,
        namespaces,
    }))
}

/// `GET /api/namespaces`
pub async fn list_namespaces(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Vec<String>>, ApiError> {
    let namespaces = state.repository.namespaces().await?;
    Ok(Json(identity.filter_namespaces(namespaces)))
}

/// `GET /api/resources/{kind}`
pub async fn list_resources(
    State(state): State<AppState>,
    identity: Identity,
    Path(kind): Path<String>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    let resources = state.repository.resources(&kind).await?;
    Ok(Json(identity.filter_resources(resources)))
}

#[derive(Debug, Serialize)]
pub struct AccessReport {
    pub namespace: String,
    pub action: String,
    pub allowed: bool,
    pub level: Option<PermissionLevel>,
}

/// `GET /api/namespaces/{namespace}/access/{action}`
pub async fn check_access(
    identity: Identity,
    Path((namespace, action)): Path<(String, String)>,
) -> Result<Json<AccessReport>, ApiError> {
    let allowed = identity.can_perform_action(&namespace, &action)?;
    let level = identity.permission_level(&namespace);

    Ok(Json(AccessReport {
        namespace,
        action,
        allowed,
        level,
    }))
}

/// `DELETE /api/namespaces/{namespace}/{kind}/{name}`
pub async fn delete_resource(
    State(state): State<AppState>,
    identity: Identity,
    Path((namespace, kind, name)): Path<(String, String, String)>,
) -> Result<StatusCode, ApiError> {
    identity.authorize(&namespace, Action::Edit)?;

    if state.repository.delete(&namespace, &kind, &name).await? {
        tracing::info!(
            user = %identity.username,
            namespace = %namespace,
            kind = %kind,
            name = %name,
            "Resource deleted"
        );
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound)
    }
}
