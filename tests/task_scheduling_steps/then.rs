//! Then steps for task scheduling BDD scenarios.

use super::world::{SchedulingWorld, run_async};
use mirrorfleet::store::domain::{AgentName, AgentStatus, Task, TaskStatus, TaskUpdate};
use rstest_bdd_macros::then;

fn last_task(world: &SchedulingWorld) -> Result<&Task, eyre::Report> {
    world
        .last_created
        .as_ref()
        .ok_or_else(|| eyre::eyre!("missing created task in scenario world"))
}

fn stored(world: &SchedulingWorld, task: &Task) -> Result<Task, eyre::Report> {
    Ok(run_async(world.repositories.tasks.get(task.id()))?)
}

fn ensure_assignee(task: &Task, agent: &str) -> Result<(), eyre::Report> {
    let assignee = task.agent_name().map(AgentName::as_str);
    eyre::ensure!(
        assignee == Some(agent),
        "expected task {} assigned to {agent}, found {assignee:?}",
        task.id()
    );
    eyre::ensure!(
        task.status() == TaskStatus::Assigned,
        "expected status assigned, found {}",
        task.status()
    );
    Ok(())
}

#[then(r#"the task is assigned to "{agent}""#)]
fn task_is_assigned_to(world: &SchedulingWorld, agent: String) -> Result<(), eyre::Report> {
    let task = stored(world, last_task(world)?)?;
    ensure_assignee(&task, &agent)
}

#[then(r#"task "{name}" is assigned to "{agent}""#)]
fn named_task_is_assigned_to(
    world: &SchedulingWorld,
    name: String,
    agent: String,
) -> Result<(), eyre::Report> {
    let created = world
        .tasks
        .get(&name)
        .ok_or_else(|| eyre::eyre!("unknown task {name}"))?;
    let task = stored(world, created)?;
    ensure_assignee(&task, &agent)
}

#[then("the task is unassigned")]
fn task_is_unassigned(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    let task = stored(world, last_task(world)?)?;
    eyre::ensure!(task.is_unassigned(), "task was assigned to {:?}", task.agent_name());
    eyre::ensure!(task.status() == TaskStatus::Pending, "task left pending");
    Ok(())
}

#[then("the task resource version is {version:i64}")]
fn task_resource_version_is(world: &SchedulingWorld, version: i64) -> Result<(), eyre::Report> {
    let task = stored(world, last_task(world)?)?;
    eyre::ensure!(
        task.resource_version().value() == version,
        "expected version {version}, found {}",
        task.resource_version()
    );
    Ok(())
}

#[then("assigning the task at its initial version is rejected as stale")]
fn initial_version_is_stale(world: &SchedulingWorld) -> Result<(), eyre::Report> {
    let created = last_task(world)?;
    let rival = AgentName::new("edge-rival")?;
    let result = run_async(world.repositories.tasks.update(
        created.id(),
        created.resource_version(),
        TaskUpdate::assign_to(rival),
    ));
    match result {
        Err(err) if err.is_stale() => Ok(()),
        other => Err(eyre::eyre!("expected a stale version error, got {other:?}")),
    }
}

#[then("{count:usize} tasks were assigned")]
fn tasks_were_assigned(world: &SchedulingWorld, count: usize) -> Result<(), eyre::Report> {
    let assigned = world
        .last_assigned
        .ok_or_else(|| eyre::eyre!("the scheduler has not ticked"))?;
    eyre::ensure!(assigned == count, "expected {count} assignments, found {assigned}");
    Ok(())
}

#[then(r#"agent "{name}" is unknown"#)]
fn agent_is_unknown(world: &SchedulingWorld, name: String) -> Result<(), eyre::Report> {
    let agent = run_async(world.repositories.agents.get_by_name(&AgentName::new(name)?))?
        .ok_or_else(|| eyre::eyre!("agent missing"))?;
    eyre::ensure!(
        agent.status() == AgentStatus::Unknown,
        "expected unknown, found {}",
        agent.status()
    );
    Ok(())
}
