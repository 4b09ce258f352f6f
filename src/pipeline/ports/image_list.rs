//! Source of Kubernetes control-plane image lists.

use crate::pipeline::domain::PipelineError;
use async_trait::async_trait;

/// Lists the images a Kubernetes release needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageListSource: Send + Sync {
    /// Returns the version of the local listing tool, such as `v1.29.0`.
    async fn client_version(&self) -> Result<String, PipelineError>;

    /// Lists the images of `kubernetes_version`.
    async fn list_images(&self, kubernetes_version: &str) -> Result<Vec<String>, PipelineError>;
}
