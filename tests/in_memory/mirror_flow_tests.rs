//! End-to-end flow from task creation to the plugin's final report.

use super::helpers::{CALLBACK, Fleet, fleet};
use eyre::{WrapErr, eyre};
use mirrorfleet::pipeline::adapters::{RecordingTransport, StaticImageList, StoreStatusReporter};
use mirrorfleet::pipeline::domain::PluginConfig;
use mirrorfleet::pipeline::services::{PluginRunner, SyncPipeline};
use mirrorfleet::store::domain::{ImageStatus, TaskId, TaskStatus};
use mirrorfleet::store::services::CreateTaskRequest;
use rstest::rstest;
use std::sync::Arc;

const IMAGES: [&str; 2] = ["docker.io/library/nginx:1.25", "docker.io/library/redis:7"];

async fn delivered_config(fleet: &Fleet) -> Result<(TaskId, PluginConfig), eyre::Report> {
    let registry = fleet.registry().await?;
    let created = fleet
        .service
        .create_task(CreateTaskRequest::new("cache", "owner-1", registry.id()).with_images(IMAGES))
        .await
        .wrap_err("create task")?;
    fleet.agent.register_if_absent().await?;

    eyre::ensure!(fleet.scheduler.tick().await? == 1, "task was not scheduled");
    eyre::ensure!(fleet.agent.discover_once().await? == 1, "task was not discovered");
    eyre::ensure!(fleet.agent.process_next().await, "queue shut down");

    let delivered = fleet.delivery.delivered();
    let (task_id, yaml) = delivered
        .first()
        .ok_or_else(|| eyre!("nothing delivered"))?;
    eyre::ensure!(*task_id == created.task.id(), "delivered the wrong task");
    Ok((*task_id, PluginConfig::from_yaml(yaml)?))
}

fn plugin(fleet: &Fleet, transport: &RecordingTransport) -> PluginRunner {
    PluginRunner::new(
        Arc::new(StaticImageList::new("v1.29.0", Vec::<String>::new())),
        SyncPipeline::new(Arc::new(transport.clone())),
        Arc::new(StoreStatusReporter::new(fleet.service.clone())),
    )
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn mirrored_task_ends_succeeded(fleet: Fleet) -> Result<(), eyre::Report> {
    let (task_id, config) = delivered_config(&fleet).await?;
    assert_eq!(config.plugin.callback, CALLBACK);
    let running = fleet.repositories.tasks.get(task_id).await?;
    assert_eq!(running.status(), TaskStatus::Running);

    let transport = RecordingTransport::new();
    plugin(&fleet, &transport).run(&config).await?;

    let finished = fleet.repositories.tasks.get(task_id).await?;
    assert_eq!(finished.status(), TaskStatus::Succeeded);
    let images = fleet.service.images_of(task_id).await?;
    assert_eq!(images.len(), 2);
    assert!(images.iter().all(|image| image.status() == ImageStatus::Succeeded));
    assert!(
        transport
            .calls()
            .contains(&"push harbor.example.com/mirror/redis:7".to_owned())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn one_failed_push_fails_the_task(fleet: Fleet) -> Result<(), eyre::Report> {
    let (task_id, config) = delivered_config(&fleet).await?;
    let transport = RecordingTransport::new().failing_push("harbor.example.com/mirror/redis:7");

    let result = plugin(&fleet, &transport).run(&config).await;

    assert!(result.is_err());
    let finished = fleet.repositories.tasks.get(task_id).await?;
    assert_eq!(finished.status(), TaskStatus::Failed);
    let images = fleet.service.images_of(task_id).await?;
    let failed: Vec<_> = images
        .iter()
        .filter(|image| image.status() == ImageStatus::Failed)
        .map(|image| image.name().as_str())
        .collect();
    assert_eq!(failed, vec!["docker.io/library/redis:7"]);
    Ok(())
}
