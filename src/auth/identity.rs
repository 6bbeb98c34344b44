//! Caller identity and its normalisation from upstream session shapes.
//!
//! Session verification happens upstream and leaves a [`SessionContext`] in
//! the request extensions. Three legacy shapes are accepted; each has its own
//! normalisation function and all of them produce the same [`Identity`].

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::{request::Parts, Extensions};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::EdgeError;

/// Caller role. `Admin` overrides the permission map entirely.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    /// Anything other than `admin` is an ordinary user.
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("admin") {
            Role::Admin
        } else {
            Role::User
        }
    }
}

/// Access level on a namespace. `Edit` implies `View`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PermissionLevel {
    View = 1,
    Edit = 2,
}

impl PermissionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionLevel::View => "view",
            PermissionLevel::Edit => "edit",
        }
    }
}

impl FromStr for PermissionLevel {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(PermissionLevel::View),
            "edit" => Ok(PermissionLevel::Edit),
            other => Err(EdgeError::Misconfigured(format!(
                "invalid permission value: {other:?}"
            ))),
        }
    }
}

impl fmt::Display for PermissionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalised caller. Built once per request and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
    pub permissions: HashMap<String, PermissionLevel>,
}

impl Identity {
    pub fn new(
        username: impl Into<String>,
        role: Role,
        permissions: HashMap<String, PermissionLevel>,
    ) -> Self {
        Self {
            username: username.into(),
            role,
            permissions,
        }
    }

    /// Resolve the identity from a request's extensions.
    pub fn from_extensions(extensions: &Extensions) -> Result<Self, EdgeError> {
        extensions
            .get::<SessionContext>()
            .ok_or(EdgeError::Unauthenticated)?
            .normalize()
    }
}

/// Typed claims as produced by the token verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub permissions: HashMap<String, String>,
}

/// Opaque session value left in the request by upstream verification.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionContext {
    /// Typed claims object.
    Claims(Claims),
    /// Generic key/value map with `username`, `role`, `permissions` keys.
    Map(Map<String, Value>),
    /// Raw username/role/permission triple.
    Raw {
        username: String,
        role: String,
        permissions: HashMap<String, String>,
    },
}

impl SessionContext {
    /// Normalise into the canonical [`Identity`].
    pub fn normalize(&self) -> Result<Identity, EdgeError> {
        match self {
            SessionContext::Claims(claims) => from_claims(claims),
            SessionContext::Map(map) => from_map(map),
            SessionContext::Raw {
                username,
                role,
                permissions,
            } => from_raw(username, role, permissions.iter()),
        }
    }
}

fn from_claims(claims: &Claims) -> Result<Identity, EdgeError> {
    from_raw(&claims.username, &claims.role, claims.permissions.iter())
}

fn from_map(map: &Map<String, Value>) -> Result<Identity, EdgeError> {
    let username = map
        .get("username")
        .and_then(Value::as_str)
        .unwrap_or_default();
    let role = map.get("role").and_then(Value::as_str).unwrap_or_default();

    let permissions = map
        .get("permissions")
        .and_then(Value::as_object)
        .into_iter()
        .flatten()
        .filter_map(|(ns, level)| level.as_str().map(|level| (ns, level)));

    from_raw(username, role, permissions)
}

fn from_raw<K, V, I>(username: &str, role: &str, permissions: I) -> Result<Identity, EdgeError>
where
    K: AsRef<str>,
    V: AsRef<str>,
    I: IntoIterator<Item = (K, V)>,
{
    let username = username.trim();
    if username.is_empty() {
        return Err(EdgeError::Unauthenticated);
    }

    let mut resolved = HashMap::new();
    for (namespace, level) in permissions {
        match level.as_ref().parse::<PermissionLevel>() {
            Ok(level) => {
                resolved.insert(namespace.as_ref().to_string(), level);
            }
            Err(_) => {
                tracing::warn!(
                    username = %username,
                    namespace = %namespace.as_ref(),
                    "Ignoring unrecognised permission level"
                );
            }
        }
    }

    Ok(Identity::new(username, Role::parse(role), resolved))
}

impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = EdgeError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Identity::from_extensions(&parts.extensions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn perms(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn all_shapes_normalize_identically() {
        let claims = SessionContext::Claims(Claims {
            username: "alice".into(),
            role: "user".into(),
            permissions: perms(&[("dev", "edit"), ("prod", "view")]),
        });
        let map = SessionContext::Map(
            json!({
                "username": "alice",
                "role": "user",
                "permissions": { "dev": "edit", "prod": "view" }
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        let raw = SessionContext::Raw {
            username: "alice".into(),
            role: "user".into(),
            permissions: perms(&[("dev", "edit"), ("prod", "view")]),
        };

        let expected = claims.normalize().unwrap();
        assert_eq!(map.normalize().unwrap(), expected);
        assert_eq!(raw.normalize().unwrap(), expected);
        assert_eq!(expected.permissions["dev"], PermissionLevel::Edit);
        assert_eq!(expected.permissions["prod"], PermissionLevel::View);
    }

    #[test]
    fn missing_username_is_unauthenticated() {
        let map = SessionContext::Map(Map::new());
        assert_eq!(map.normalize(), Err(EdgeError::Unauthenticated));
    }

    #[test]
    fn unknown_role_is_user_and_bad_levels_dropped() {
        let identity = SessionContext::Raw {
            username: "bob".into(),
            role: "superuser".into(),
            permissions: perms(&[("dev", "owner"), ("qa", "view")]),
        }
        .normalize()
        .unwrap();

        assert_eq!(identity.role, Role::User);
        assert_eq!(identity.permissions.len(), 1);
        assert!(identity.permissions.contains_key("qa"));
    }

    #[test]
    fn absent_context_is_unauthenticated() {
        let extensions = Extensions::new();
        assert_eq!(
            Identity::from_extensions(&extensions),
            Err(EdgeError::Unauthenticated)
        );
    }

    #[test]
    fn edit_orders_above_view() {
        assert!(PermissionLevel::Edit > PermissionLevel::View);
        assert!("admin".parse::<PermissionLevel>().is_err());
    }
}
