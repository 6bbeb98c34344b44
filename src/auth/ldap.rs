//! Admin determination, including directory group membership.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::auth::identity::Identity;

/// Failure talking to the directory. Never surfaced to callers.
#[derive(Debug, Error)]
pub enum LdapError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),

    #[error("lookup failed: {0}")]
    Lookup(String),
}

/// Directory admin-group settings reported by the checker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LdapAdminConfig {
    pub enabled: bool,
    pub admin_groups: Vec<String>,
}

/// Directory client collaborator.
#[async_trait]
pub trait LdapAdminChecker: Send + Sync {
    async fn config(&self) -> Result<LdapAdminConfig, LdapError>;

    async fn user_groups(&self, username: &str) -> Result<Vec<String>, LdapError>;
}

/// Role-based admin, or membership in a configured directory admin group.
///
/// Directory errors and timeouts resolve to `false`.
pub async fn is_admin(
    identity: &Identity,
    checker: Option<&dyn LdapAdminChecker>,
    deadline: Duration,
) -> bool {
    if identity.is_role_admin() {
        return true;
    }
    let Some(checker) = checker else {
        return false;
    };

    match tokio::time::timeout(deadline, directory_admin(identity, checker)).await {
        Ok(Ok(admin)) => admin,
        Ok(Err(e)) => {
            tracing::warn!(username = %identity.username, error = %e, "Directory admin check failed");
            false
        }
        Err(_) => {
            tracing::warn!(
                username = %identity.username,
                timeout_ms = deadline.as_millis() as u64,
                "Directory admin check timed out"
            );
            false
        }
    }
}

async fn directory_admin(
    identity: &Identity,
    checker: &dyn LdapAdminChecker,
) -> Result<bool, LdapError> {
    let config = checker.config().await?;
    if !config.enabled || config.admin_groups.is_empty() {
        return Ok(false);
    }

    let groups = checker.user_groups(&identity.username).await?;
    Ok(groups.iter().any(|group| {
        config
            .admin_groups
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(group))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::identity::Role;
    use std::collections::HashMap;

    struct FakeDirectory {
        config: LdapAdminConfig,
        groups: Result<Vec<String>, &'static str>,
        delay: Duration,
    }

    #[async_trait]
    impl LdapAdminChecker for FakeDirectory {
        async fn config(&self) -> Result<LdapAdminConfig, LdapError> {
            Ok(self.config.clone())
        }

        async fn user_groups(&self, _username: &str) -> Result<Vec<String>, LdapError> {
            tokio::time::sleep(self.delay).await;
            self.groups
                .clone()
                .map_err(|e| LdapError::Unavailable(e.to_string()))
        }
    }

    fn directory(groups: Result<Vec<String>, &'static str>) -> FakeDirectory {
        FakeDirectory {
            config: LdapAdminConfig {
                enabled: true,
                admin_groups: vec!["cn=Ops,ou=groups".into()],
            },
            groups,
            delay: Duration::ZERO,
        }
    }

    fn alice() -> Identity {
        Identity::new("alice", Role::User, HashMap::new())
    }

    const DEADLINE: Duration = Duration::from_secs(1);

    #[tokio::test]
    async fn role_admin_needs_no_directory() {
        let root = Identity::new("root", Role::Admin, HashMap::new());
        assert!(is_admin(&root, None, DEADLINE).await);
    }

    #[tokio::test]
    async fn group_membership_grants_admin() {
        let dir = directory(Ok(vec!["cn=dev".into(), "CN=ops,OU=groups".into()]));
        assert!(is_admin(&alice(), Some(&dir), DEADLINE).await);
    }

    #[tokio::test]
    async fn no_overlap_is_not_admin() {
        let dir = directory(Ok(vec!["cn=dev".into()]));
        assert!(!is_admin(&alice(), Some(&dir), DEADLINE).await);
        assert!(!is_admin(&alice(), None, DEADLINE).await);
    }

    #[tokio::test]
    async fn disabled_or_empty_config_is_not_admin() {
        let mut dir = directory(Ok(vec!["cn=Ops,ou=groups".into()]));
        dir.config.enabled = false;
        assert!(!is_admin(&alice(), Some(&dir), DEADLINE).await);

        dir.config.enabled = true;
        dir.config.admin_groups.clear();
        assert!(!is_admin(&alice(), Some(&dir), DEADLINE).await);
    }

    #[tokio::test]
    async fn directory_error_fails_closed() {
        let dir = directory(Err("connection refused"));
        assert!(!is_admin(&alice(), Some(&dir), DEADLINE).await);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_directory_fails_closed() {
        let mut dir = directory(Ok(vec!["cn=Ops,ou=groups".into()]));
        dir.delay = Duration::from_secs(30);
        assert!(!is_admin(&alice(), Some(&dir), DEADLINE).await);
    }
}
