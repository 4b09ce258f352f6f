//! The plugin side of a task: resolve images, sync them, report back.

use super::SyncPipeline;
use crate::pipeline::{
    domain::{ImageReport, PipelineError, PluginConfig, SyncSummary, TaskReport},
    ports::{ImageListSource, StatusReporter},
};
use crate::store::domain::{ImageName, ImageStatus, TaskStatus};
use std::sync::Arc;
use tracing::{info, warn};

/// Executes one rendered [`PluginConfig`].
#[derive(Clone)]
pub struct PluginRunner {
    image_source: Arc<dyn ImageListSource>,
    pipeline: SyncPipeline,
    reporter: Arc<dyn StatusReporter>,
}

impl PluginRunner {
    /// Creates a runner from its collaborators.
    #[must_use]
    pub fn new(
        image_source: Arc<dyn ImageListSource>,
        pipeline: SyncPipeline,
        reporter: Arc<dyn StatusReporter>,
    ) -> Self {
        Self {
            image_source,
            pipeline,
            reporter,
        }
    }

    /// Resolves the image set, mirrors it and reports the outcome.
    ///
    /// Outcomes are reported only when `plugin.synced` is set. A reporting
    /// failure is logged and does not change the result.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] for an unusable configuration, the
    /// login failure, or the first image failure to complete.
    pub async fn run(&self, config: &PluginConfig) -> Result<(), PipelineError> {
        let summary = match self.resolve_and_sync(config).await {
            Ok(summary) => summary,
            Err(err) => {
                self.report_task(config, TaskStatus::Failed, &err.to_string())
                    .await;
                return Err(err);
            }
        };

        if config.plugin.synced {
            self.report_images(config, &summary).await;
        }
        let result = summary.into_result();
        match &result {
            Ok(()) => {
                self.report_task(config, TaskStatus::Succeeded, "").await;
            }
            Err(err) => {
                self.report_task(config, TaskStatus::Failed, &err.to_string())
                    .await;
            }
        }
        result
    }

    /// Builds the image list: Kubernetes images first, then listed images.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the Kubernetes version is
    /// missing or does not match the local tool, or when an image name is
    /// invalid. Tool failures propagate as they are.
    pub async fn resolve_images(
        &self,
        config: &PluginConfig,
    ) -> Result<Vec<ImageName>, PipelineError> {
        let mut images = Vec::new();
        if config.default.push_kubernetes {
            let version = config.kubernetes.version.trim();
            if version.is_empty() {
                return Err(PipelineError::config("failed to find kubernetes version"));
            }
            let client = self.image_source.client_version().await?;
            if client != version {
                return Err(PipelineError::config(format!(
                    "kubeadm version {client} does not match kubernetes version {version}"
                )));
            }
            for raw in self.image_source.list_images(version).await? {
                images.push(
                    ImageName::new(raw).map_err(|err| PipelineError::config(err.to_string()))?,
                );
            }
        }
        if config.default.push_images {
            images.extend(config.listed_images()?);
        }
        Ok(images)
    }

    async fn resolve_and_sync(&self, config: &PluginConfig) -> Result<SyncSummary, PipelineError> {
        let images = self.resolve_images(config).await?;
        info!(task_id = config.plugin.task_id, images = images.len(), "resolved images");
        self.pipeline.sync(&config.registry, &images).await
    }

    async fn report_images(&self, config: &PluginConfig, summary: &SyncSummary) {
        for outcome in summary.outcomes() {
            let (status, message) = match &outcome.result {
                Ok(()) => (ImageStatus::Succeeded, String::new()),
                Err(err) => (ImageStatus::Failed, err.to_string()),
            };
            let report = ImageReport {
                task_id: config.plugin.task_id,
                name: outcome.image.to_string(),
                status,
                message,
            };
            if let Err(err) = self.reporter.report_image(&report).await {
                warn!(image = %outcome.image, error = %err, "failed to report image status");
            }
        }
    }

    async fn report_task(&self, config: &PluginConfig, status: TaskStatus, message: &str) {
        if !config.plugin.synced {
            return;
        }
        let report = TaskReport {
            task_id: config.plugin.task_id,
            status,
            message: message.to_owned(),
        };
        if let Err(err) = self.reporter.report_task(&report).await {
            warn!(task_id = config.plugin.task_id, error = %err, "failed to report task status");
        }
    }
}
