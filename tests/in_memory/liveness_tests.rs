//! Heartbeat and monitor interplay.

use super::helpers::{Fleet, agent_name, fleet};
use chrono::Duration;
use eyre::eyre;
use mirrorfleet::store::domain::{
    AGENT_STARTED_MESSAGE, AGENT_STOPPED_MESSAGE, AgentStatus, NewTask,
};
use rstest::rstest;

async fn agent_status(fleet: &Fleet) -> Result<(AgentStatus, String), eyre::Report> {
    let agent = fleet
        .repositories
        .agents
        .get_by_name(&agent_name())
        .await?
        .ok_or_else(|| eyre!("agent missing"))?;
    Ok((agent.status(), agent.message().to_owned()))
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn silent_agent_is_demoted_then_revived(fleet: Fleet) -> Result<(), eyre::Report> {
    fleet.agent.register_if_absent().await?;

    fleet.clock.advance(Duration::minutes(4));
    assert_eq!(fleet.monitor.tick().await?, 0);

    fleet.clock.advance(Duration::minutes(2));
    assert_eq!(fleet.monitor.tick().await?, 1);
    assert_eq!(
        agent_status(&fleet).await?,
        (AgentStatus::Unknown, AGENT_STOPPED_MESSAGE.to_owned())
    );
    assert_eq!(fleet.monitor.tick().await?, 0);

    fleet.agent.heartbeat_once().await?;
    assert_eq!(
        agent_status(&fleet).await?,
        (AgentStatus::Running, AGENT_STARTED_MESSAGE.to_owned())
    );
    assert_eq!(fleet.monitor.tick().await?, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn demoted_agent_gets_no_new_tasks(fleet: Fleet) -> Result<(), eyre::Report> {
    let registry = fleet.registry().await?;
    fleet.agent.register_if_absent().await?;
    fleet.clock.advance(Duration::minutes(10));
    fleet.monitor.tick().await?;
    let task = fleet
        .repositories
        .tasks
        .create(NewTask::new("late", "owner-1", registry.id())?)
        .await?;

    assert_eq!(fleet.scheduler.tick().await?, 0);
    assert!(fleet.repositories.tasks.get(task.id()).await?.is_unassigned());
    Ok(())
}
