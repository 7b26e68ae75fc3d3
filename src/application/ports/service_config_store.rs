use async_trait::async_trait;

use crate::domain::ServiceConfig;

use super::RepositoryError;

#[async_trait]
pub trait ServiceConfigStore: Send + Sync {
    async fn add(&self, config: &ServiceConfig) -> Result<(), RepositoryError>;

    async fn get(&self, name: &str) -> Result<Option<ServiceConfig>, RepositoryError>;

    async fn get_active(&self) -> Result<Option<ServiceConfig>, RepositoryError>;

    async fn list(&self) -> Result<Vec<ServiceConfig>, RepositoryError>;

    /// Deactivates every other configuration, then activates `name`.
    /// Each document is written on its own; concurrent activations race and
    /// the last writer wins.
    async fn activate(&self, name: &str) -> Result<ServiceConfig, RepositoryError>;
}
