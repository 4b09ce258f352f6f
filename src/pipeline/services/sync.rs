//! Concurrent pull, tag and push of an image set.

use crate::exec::ToolError;
use crate::pipeline::{
    domain::{
        ImageOutcome, PipelineError, RegistryCredentials, SyncSummary, TransportStage,
        target_image,
    },
    ports::RegistryTransport,
};
use crate::store::domain::ImageName;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Mirrors images into one registry, one concurrent task per image.
#[derive(Clone)]
pub struct SyncPipeline {
    transport: Arc<dyn RegistryTransport>,
}

impl SyncPipeline {
    /// Creates a pipeline over `transport`.
    #[must_use]
    pub fn new(transport: Arc<dyn RegistryTransport>) -> Self {
        Self { transport }
    }

    /// Logs in once, then pulls, tags and pushes every image concurrently.
    ///
    /// Waits for every image before returning. Per-image failures are kept
    /// in the summary.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Transport`] when the login fails. No image
    /// work starts in that case.
    pub async fn sync(
        &self,
        registry: &RegistryCredentials,
        images: &[ImageName],
    ) -> Result<SyncSummary, PipelineError> {
        self.transport
            .login(registry)
            .await
            .map_err(|source| PipelineError::Transport {
                image: registry.repository.clone(),
                stage: TransportStage::Login,
                source,
            })?;
        info!(registry = %registry.repository, images = images.len(), "starting image sync");

        let mut workers = JoinSet::new();
        let mut spawned = HashMap::with_capacity(images.len());
        for image in images {
            let transport = Arc::clone(&self.transport);
            let source = image.clone();
            let target = target_image(image.as_str(), &registry.repository, &registry.namespace);
            let worker_target = target.clone();
            let handle = workers.spawn(async move {
                let result = mirror(transport.as_ref(), source.as_str(), &worker_target).await;
                ImageOutcome {
                    image: source,
                    target: worker_target,
                    result,
                }
            });
            spawned.insert(handle.id(), (image.clone(), target));
        }

        let mut outcomes = Vec::with_capacity(images.len());
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(outcome) => {
                    if let Err(err) = &outcome.result {
                        warn!(image = %outcome.image, error = %err, "image sync failed");
                    } else {
                        debug!(image = %outcome.image, target = %outcome.target, "image synced");
                    }
                    outcomes.push(outcome);
                }
                Err(err) => {
                    warn!(error = %err, "image worker aborted");
                    if let Some((image, target)) = spawned.remove(&err.id()) {
                        outcomes.push(ImageOutcome {
                            image,
                            target,
                            result: Err(PipelineError::Aborted(err.to_string())),
                        });
                    }
                }
            }
        }
        Ok(SyncSummary::new(outcomes))
    }

    /// Runs [`SyncPipeline::sync`] and collapses it to the first failure.
    ///
    /// # Errors
    ///
    /// Returns the login failure or the first image failure to complete.
    pub async fn run(
        &self,
        registry: &RegistryCredentials,
        images: &[ImageName],
    ) -> Result<(), PipelineError> {
        self.sync(registry, images).await?.into_result()
    }
}

async fn mirror(
    transport: &dyn RegistryTransport,
    source: &str,
    target: &str,
) -> Result<(), PipelineError> {
    transport
        .pull(source)
        .await
        .map_err(|err| transport_error(TransportStage::Pull, source, err))?;
    transport
        .tag(source, target)
        .await
        .map_err(|err| transport_error(TransportStage::Tag, source, err))?;
    transport
        .push(target)
        .await
        .map_err(|err| transport_error(TransportStage::Push, target, err))
}

fn transport_error(stage: TransportStage, image: &str, source: ToolError) -> PipelineError {
    PipelineError::Transport {
        image: image.to_owned(),
        stage,
        source,
    }
}
