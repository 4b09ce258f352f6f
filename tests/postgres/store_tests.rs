//! Version-checked task updates and listings against `PostgreSQL`.

use super::helpers::{TestStore, test_store};
use mirrorfleet::store::domain::{
    Agent, AgentKind, AgentName, AgentStatus, AgentUpdate, ImageName, ImageStatus, NewRegistry,
    NewTask, ResourceVersion, Task, TaskId, TaskStatus, TaskUpdate,
};
use mirrorfleet::store::ports::{PageRequest, StoreError};
use mockable::DefaultClock;
use rstest::rstest;

async fn seeded_task(store: &TestStore, name: &str) -> Result<Task, eyre::Report> {
    let registry = store
        .repositories
        .registries
        .create(NewRegistry::new("owner-1", "harbor.example.com", "mirror")?)
        .await?;
    Ok(store
        .repositories
        .tasks
        .create(NewTask::new(name, "owner-1", registry.id())?)
        .await?)
}

fn edge() -> Result<AgentName, eyre::Report> {
    Ok(AgentName::new("edge-1")?)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn stale_update_leaves_the_row_unchanged() -> Result<(), eyre::Report> {
    let Some(store) = test_store()? else {
        return Ok(());
    };
    let task = seeded_task(&store, "nginx").await?;
    let tasks = &store.repositories.tasks;

    let assigned = tasks
        .update(task.id(), task.resource_version(), TaskUpdate::assign_to(edge()?))
        .await?;
    assert_eq!(assigned.resource_version(), ResourceVersion::new(2));
    assert_eq!(assigned.status(), TaskStatus::Assigned);

    let stale = tasks
        .update(
            task.id(),
            task.resource_version(),
            TaskUpdate::status(TaskStatus::Failed, "late"),
        )
        .await;
    assert!(matches!(stale, Err(StoreError::StaleVersion { .. })));

    let current = tasks.get(task.id()).await?;
    assert_eq!(current.resource_version(), ResourceVersion::new(2));
    assert_eq!(current.status(), TaskStatus::Assigned);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn missing_rows_are_stale_on_update_and_absent_on_read() -> Result<(), eyre::Report> {
    let Some(store) = test_store()? else {
        return Ok(());
    };
    let absent = TaskId::new(9_999)?;

    let updated = store
        .repositories
        .tasks
        .update(absent, ResourceVersion::INITIAL, TaskUpdate::default())
        .await;

    assert!(updated.is_err_and(|err| err.is_stale()));
    assert!(
        store
            .repositories
            .tasks
            .get(absent)
            .await
            .is_err_and(|err| err.is_not_found())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_filter_and_paginate() -> Result<(), eyre::Report> {
    let Some(store) = test_store()? else {
        return Ok(());
    };
    let first = seeded_task(&store, "one").await?;
    let second = seeded_task(&store, "two").await?;
    let third = seeded_task(&store, "three").await?;
    let tasks = &store.repositories.tasks;
    tasks
        .update(second.id(), second.resource_version(), TaskUpdate::assign_to(edge()?))
        .await?;

    let page = tasks.list_unassigned(PageRequest::first(1)).await?;
    assert_eq!(page.items.iter().map(Task::id).collect::<Vec<_>>(), vec![first.id()]);
    let cursor = page.next.ok_or_else(|| eyre::eyre!("expected another page"))?;
    let rest = tasks.list_unassigned(PageRequest::first(1).after(cursor)).await?;
    assert_eq!(rest.items.iter().map(Task::id).collect::<Vec<_>>(), vec![third.id()]);

    let waiting = tasks
        .list_assigned_to(&edge()?, &[TaskStatus::Assigned], PageRequest::default())
        .await?;
    assert_eq!(waiting.items.iter().map(Task::id).collect::<Vec<_>>(), vec![second.id()]);
    let running = tasks
        .list_assigned_to(&edge()?, &[TaskStatus::Running], PageRequest::default())
        .await?;
    assert!(running.items.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn agents_are_unique_and_partially_updated() -> Result<(), eyre::Report> {
    let Some(store) = test_store()? else {
        return Ok(());
    };
    let agents = &store.repositories.agents;
    let agent = Agent::register(edge()?, AgentKind::Public, &DefaultClock);
    agents.create(&agent).await?;

    assert!(matches!(
        agents.create(&agent).await,
        Err(StoreError::Duplicate { .. })
    ));

    let demoted = agents
        .update_by_name(
            &edge()?,
            AgentUpdate::default().with_status(AgentStatus::Unknown, "stopped"),
        )
        .await?;
    assert_eq!(demoted.status(), AgentStatus::Unknown);
    assert_eq!(demoted.last_heartbeat(), agent.last_heartbeat());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn image_outcomes_match_by_task_and_name() -> Result<(), eyre::Report> {
    let Some(store) = test_store()? else {
        return Ok(());
    };
    let task = seeded_task(&store, "nginx").await?;
    let images = &store.repositories.images;
    let nginx = ImageName::new("docker.io/library/nginx:1.25")?;
    images
        .create_for_task(task.id(), &[nginx.clone(), ImageName::new("docker.io/library/redis:7")?])
        .await?;

    let updated = images
        .update_status(task.id(), &nginx, ImageStatus::Failed, "denied")
        .await?;
    assert_eq!(updated.status(), ImageStatus::Failed);
    assert_eq!(updated.message(), "denied");

    let unknown = images
        .update_status(task.id(), &ImageName::new("quay.io/other:1")?, ImageStatus::Succeeded, "")
        .await;
    assert!(unknown.is_err_and(|err| err.is_not_found()));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_and_images_are_created_in_one_transaction() -> Result<(), eyre::Report> {
    let Some(store) = test_store()? else {
        return Ok(());
    };
    let registry = store
        .repositories
        .registries
        .create(NewRegistry::new("owner-1", "harbor.example.com", "mirror")?)
        .await?;
    let tasks = &store.repositories.tasks;
    let stored = tasks
        .create_with_images(
            NewTask::new("nginx", "owner-1", registry.id())?,
            &[ImageName::new("docker.io/library/nginx:1.25")?],
        )
        .await?;
    assert_eq!(stored.1.len(), 1);

    // The image column holds at most 512 characters, so the second insert fails.
    let oversized = ImageName::new(format!("docker.io/library/{}", "a".repeat(600)))?;
    let result = tasks
        .create_with_images(NewTask::new("too long", "owner-1", registry.id())?, &[oversized])
        .await;
    assert!(matches!(result, Err(StoreError::Persistence(_))));

    let unassigned = tasks.list_unassigned(PageRequest::default()).await?;
    let ids: Vec<_> = unassigned.items.iter().map(Task::id).collect();
    assert_eq!(ids, vec![stored.0.id()]);
    Ok(())
}
