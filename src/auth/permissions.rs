//! Namespace authorization over a normalised [`Identity`].
//!
//! Everything here is pure and synchronous. Access denial is a `false` or a
//! `None`, never an error; only unrecognised action names are errors.

use std::fmt;
use std::str::FromStr;

use crate::auth::identity::{Identity, PermissionLevel, Role};
use crate::error::EdgeError;

/// An action a caller wants to perform on a namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    View,
    Edit,
}

impl Action {
    /// The permission level this action requires.
    pub fn required_level(self) -> PermissionLevel {
        match self {
            Action::View => PermissionLevel::View,
            Action::Edit => PermissionLevel::Edit,
        }
    }
}

impl FromStr for Action {
    type Err = EdgeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "view" => Ok(Action::View),
            "edit" => Ok(Action::Edit),
            other => Err(EdgeError::Misconfigured(format!("invalid action: {other:?}"))),
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.required_level().as_str())
    }
}

/// Anything that lives in a namespace. An empty namespace means cluster-scoped.
pub trait Namespaced {
    fn namespace(&self) -> &str;
}

impl Identity {
    pub fn is_role_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// True for admins and for any namespace present in the permission map.
    pub fn has_namespace_access(&self, namespace: &str) -> bool {
        self.is_role_admin() || self.permissions.contains_key(namespace)
    }

    /// Admins get `Edit` everywhere; otherwise the map entry, if any.
    pub fn permission_level(&self, namespace: &str) -> Option<PermissionLevel> {
        if self.is_role_admin() {
            return Some(PermissionLevel::Edit);
        }
        self.permissions.get(namespace).copied()
    }

    /// Like [`Identity::permission_level`] but with the denial as an error.
    pub fn require_level(&self, namespace: &str) -> Result<PermissionLevel, EdgeError> {
        self.permission_level(namespace)
            .ok_or(EdgeError::Forbidden("no access to namespace"))
    }

    pub fn permits(&self, namespace: &str, action: Action) -> bool {
        self.permission_level(namespace)
            .is_some_and(|level| level >= action.required_level())
    }

    /// Resolve an action by name. Unknown names are a caller error; a missing
    /// namespace entry is `Ok(false)`.
    pub fn can_perform_action(&self, namespace: &str, action: &str) -> Result<bool, EdgeError> {
        let action = action.parse::<Action>()?;
        Ok(self.permits(namespace, action))
    }

    /// `Forbidden` unless [`Identity::permits`] holds.
    pub fn authorize(&self, namespace: &str, action: Action) -> Result<(), EdgeError> {
        if self.permits(namespace, action) {
            Ok(())
        } else {
            tracing::debug!(
                username = %self.username,
                namespace = %namespace,
                action = %action,
                "Action denied"
            );
            Err(EdgeError::Forbidden("insufficient permissions for namespace"))
        }
    }

    /// Keep the namespaces this identity can see, in input order.
    pub fn filter_namespaces(&self, namespaces: Vec<String>) -> Vec<String> {
        if self.is_role_admin() {
            return namespaces;
        }
        namespaces
            .into_iter()
            .filter(|ns| self.permissions.contains_key(ns))
            .collect()
    }

    /// Keep cluster-scoped resources and those in accessible namespaces.
    pub fn filter_resources<T: Namespaced>(&self, resources: Vec<T>) -> Vec<T> {
        if self.is_role_admin() {
            return resources;
        }
        resources
            .into_iter()
            .filter(|r| r.namespace().is_empty() || self.has_namespace_access(r.namespace()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[derive(Debug, PartialEq)]
    struct Res(&'static str, &'static str);

    impl Namespaced for Res {
        fn namespace(&self) -> &str {
            self.1
        }
    }

    fn user(perms: &[(&str, PermissionLevel)]) -> Identity {
        Identity::new(
            "alice",
            Role::User,
            perms.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
        )
    }

    fn admin() -> Identity {
        Identity::new("root", Role::Admin, HashMap::new())
    }

    #[test]
    fn admin_sees_every_namespace() {
        let admin = admin();
        for ns in ["default", "kube-system", "never-seen-before", ""] {
            assert!(admin.has_namespace_access(ns));
            assert_eq!(admin.permission_level(ns), Some(PermissionLevel::Edit));
            assert!(admin.permits(ns, Action::Edit));
        }
    }

    #[test]
    fn user_access_matches_permission_keys() {
        let alice = user(&[("dev", PermissionLevel::View)]);
        assert!(alice.has_namespace_access("dev"));
        assert!(!alice.has_namespace_access("prod"));
        assert_eq!(alice.permission_level("prod"), None);
        assert!(matches!(
            alice.require_level("prod"),
            Err(EdgeError::Forbidden(_))
        ));
    }

    #[test]
    fn empty_permission_map_grants_nothing() {
        let nobody = user(&[]);
        assert!(!nobody.has_namespace_access("default"));
        assert!(!nobody.is_role_admin());
        assert!(nobody.filter_namespaces(vec!["default".into()]).is_empty());
        assert_eq!(nobody.can_perform_action("default", "view"), Ok(false));
    }

    #[test]
    fn edit_implies_view() {
        let alice = user(&[("dev", PermissionLevel::Edit), ("qa", PermissionLevel::View)]);
        for ns in ["dev", "qa", "prod"] {
            if alice.permits(ns, Action::Edit) {
                assert!(alice.permits(ns, Action::View));
            }
        }
        assert!(alice.permits("dev", Action::Edit));
        assert!(alice.permits("qa", Action::View));
        assert!(!alice.permits("qa", Action::Edit));
    }

    #[test]
    fn unknown_action_is_misconfigured() {
        let alice = user(&[("dev", PermissionLevel::Edit)]);
        assert!(matches!(
            alice.can_perform_action("dev", "delete"),
            Err(EdgeError::Misconfigured(_))
        ));
        assert_eq!(alice.can_perform_action("dev", "edit"), Ok(true));
    }

    #[test]
    fn authorize_reports_forbidden() {
        let alice = user(&[("qa", PermissionLevel::View)]);
        assert!(alice.authorize("qa", Action::View).is_ok());
        assert!(matches!(
            alice.authorize("qa", Action::Edit),
            Err(EdgeError::Forbidden(_))
        ));
    }

    #[test]
    fn namespace_filter_preserves_order() {
        let alice = user(&[("c", PermissionLevel::View), ("a", PermissionLevel::Edit)]);
        let input = vec!["a".to_string(), "b".into(), "c".into()];
        assert_eq!(alice.filter_namespaces(input.clone()), vec!["a", "c"]);
        assert_eq!(admin().filter_namespaces(input.clone()), input);
    }

    #[test]
    fn resource_filter_keeps_cluster_scoped() {
        let alice = user(&[("dev", PermissionLevel::View)]);
        let resources = vec![Res("node-1", ""), Res("api", "dev"), Res("db", "prod")];
        assert_eq!(
            alice.filter_resources(resources),
            vec![Res("node-1", ""), Res("api", "dev")]
        );
    }
}
