//! Config delivery port.

use crate::exec::ToolError;
use crate::store::domain::TaskId;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Errors raised while handing a rendered config to the plugin.
#[derive(Debug, Clone, Error)]
pub enum DeliveryError {
    /// A filesystem step failed.
    #[error("failed to {action} {path}: {source}")]
    Io {
        /// What was being done, for example `create`.
        action: &'static str,
        /// Path involved.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: Arc<std::io::Error>,
    },

    /// A version-control command failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// The blocking filesystem worker did not finish.
    #[error("delivery worker failed: {0}")]
    Worker(String),
}

impl DeliveryError {
    pub(crate) fn io(
        action: &'static str,
        path: impl Into<Utf8PathBuf>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            action,
            path: path.into(),
            source: Arc::new(source),
        }
    }
}

/// Hands a rendered plugin config to the execution target of a task.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ConfigDelivery: Send + Sync {
    /// Publishes `config_yaml` as the current configuration of `task_id`.
    async fn deliver(&self, task_id: TaskId, config_yaml: &str) -> Result<(), DeliveryError>;
}
