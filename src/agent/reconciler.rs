//! Reconciliation of one discovered task key.

use super::{AgentError, TaskKey};
use crate::delivery::ports::ConfigDelivery;
use crate::pipeline::domain::{PluginConfig, PluginOptions, PushOptions, RegistryCredentials};
use crate::store::domain::{AgentName, Image, Registry, Task, TaskStatus, TaskUpdate};
use crate::store::ports::Repositories;
use std::sync::Arc;
use tracing::{debug, info};

/// Message written when a task moves to `running`.
pub const CONFIG_DELIVERED_MESSAGE: &str = "configuration delivered";

/// What reconciling a key did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The config was delivered and the task moved to `running`.
    Delivered,
    /// The key was obsolete or another writer won the version check.
    Skipped,
}

/// Renders, delivers and acknowledges the tasks assigned to one agent.
#[derive(Clone)]
pub struct TaskReconciler {
    agent: AgentName,
    callback: String,
    repositories: Repositories,
    delivery: Arc<dyn ConfigDelivery>,
}

impl std::fmt::Debug for TaskReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskReconciler")
            .field("agent", &self.agent)
            .field("callback", &self.callback)
            .finish_non_exhaustive()
    }
}

impl TaskReconciler {
    /// Creates a reconciler acting for `agent`.
    ///
    /// `callback` is the base URL the plugin reports to.
    #[must_use]
    pub fn new(
        agent: AgentName,
        callback: impl Into<String>,
        repositories: Repositories,
        delivery: Arc<dyn ConfigDelivery>,
    ) -> Self {
        Self {
            agent,
            callback: callback.into(),
            repositories,
            delivery,
        }
    }

    /// Reconciles the task named by `key`.
    ///
    /// Returns [`SyncOutcome::Skipped`] when the task has moved past the
    /// key's version or is no longer waiting for this agent.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] when a store read, rendering or delivery fails.
    /// The task is left `assigned` so a retry can pick it up.
    pub async fn sync(&self, key: TaskKey) -> Result<SyncOutcome, AgentError> {
        let task = self
            .repositories
            .tasks
            .get_by_id_and_version(key.id, key.version)
            .await?;
        if task.resource_version() != key.version {
            debug!(
                task_id = %key.id,
                key_version = %key.version,
                current_version = %task.resource_version(),
                "skipping obsolete key"
            );
            return Ok(SyncOutcome::Skipped);
        }
        if !task.awaits_pickup_by(&self.agent) {
            debug!(
                task_id = %key.id,
                status = %task.status(),
                "task is not waiting for this agent"
            );
            return Ok(SyncOutcome::Skipped);
        }

        let registry = self.repositories.registries.get(task.registry_id()).await?;
        let images = self.repositories.images.list_for_task(task.id()).await?;
        let yaml = render_config(&task, &registry, &images, &self.callback).to_yaml()?;
        self.delivery.deliver(task.id(), &yaml).await?;

        let update = TaskUpdate::status(TaskStatus::Running, CONFIG_DELIVERED_MESSAGE);
        match self.repositories.tasks.update(task.id(), key.version, update).await {
            Ok(running) => {
                info!(
                    task_id = %running.id(),
                    version = %running.resource_version(),
                    "task running"
                );
                Ok(SyncOutcome::Delivered)
            }
            Err(err) if err.is_stale() => {
                debug!(task_id = %key.id, "task advanced during delivery");
                Ok(SyncOutcome::Skipped)
            }
            Err(err) => Err(err.into()),
        }
    }
}

/// Builds the plugin config for `task`.
///
/// Explicit images are pushed and outcomes are reported to `callback`.
#[must_use]
pub fn render_config(
    task: &Task,
    registry: &Registry,
    images: &[Image],
    callback: &str,
) -> PluginConfig {
    PluginConfig {
        default: PushOptions {
            push_images: true,
            push_kubernetes: false,
        },
        plugin: PluginOptions {
            callback: callback.to_owned(),
            task_id: task.id().value(),
            synced: true,
        },
        registry: RegistryCredentials::from(registry),
        images: images
            .iter()
            .map(|image| image.name().as_str().to_owned())
            .collect(),
        ..PluginConfig::default()
    }
}
