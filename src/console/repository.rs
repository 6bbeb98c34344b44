//! Resource listing collaborator.
//!
//! The real implementation talks to the cluster API and lives elsewhere; the
//! edge only needs namespaces, resource listings and deletes to authorize.

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

use crate::auth::Namespaced;
use crate::config::{ConsoleData, ResourceEntry};

/// A listed resource. An empty namespace means cluster-scoped.
pub type Resource = ResourceEntry;

impl Namespaced for ResourceEntry {
    fn namespace(&self) -> &str {
        &self.namespace
    }
}

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("cluster API unavailable: {0}")]
    Unavailable(String),
}

/// Source of namespaces and resources.
#[async_trait]
pub trait ResourceRepository: Send + Sync {
    async fn namespaces(&self) -> Result<Vec<String>, RepositoryError>;

    async fn resources(&self, kind: &str) -> Result<Vec<Resource>, RepositoryError>;

    /// Returns `false` when no such resource exists.
    async fn delete(&self, namespace: &str, kind: &str, name: &str) -> Result<bool, RepositoryError>;
}

/// In-memory repository seeded from configuration.
#[derive(Debug, Default)]
pub struct StaticRepository {
    namespaces: Vec<String>,
    resources: RwLock<Vec<Resource>>,
}

impl StaticRepository {
    pub fn new(data: &ConsoleData) -> Self {
        Self {
            namespaces: data.namespaces.clone(),
            resources: RwLock::new(data.resources.clone()),
        }
    }
}

#[async_trait]
impl ResourceRepository for StaticRepository {
    async fn namespaces(&self) -> Result<Vec<String>, RepositoryError> {
        Ok(self.namespaces.clone())
    }

    async fn resources(&self, kind: &str) -> Result<Vec<Resource>, RepositoryError> {
        Ok(self
            .resources
            .read()
            .iter()
            .filter(|r| r.kind.eq_ignore_ascii_case(kind))
            .cloned()
            .collect())
    }

    async fn delete(&self, namespace: &str, kind: &str, name: &str) -> Result<bool, RepositoryError> {
        let mut resources = self.resources.write();
        let before = resources.len();
        resources.retain(|r| {
            !(r.namespace == namespace && r.kind.eq_ignore_ascii_case(kind) && r.name == name)
        });
        Ok(resources.len() < before)
    }
}
