//! Registry transport port.

use crate::exec::ToolError;
use crate::pipeline::domain::RegistryCredentials;
use async_trait::async_trait;

/// Moves images between registries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// Authenticates against the target registry.
    async fn login(&self, registry: &RegistryCredentials) -> Result<(), ToolError>;

    /// Fetches `image` from its source registry.
    async fn pull(&self, image: &str) -> Result<(), ToolError>;

    /// Names the local copy of `source` as `target`.
    async fn tag(&self, source: &str, target: &str) -> Result<(), ToolError>;

    /// Uploads `target` to its registry.
    async fn push(&self, target: &str) -> Result<(), ToolError>;
}
