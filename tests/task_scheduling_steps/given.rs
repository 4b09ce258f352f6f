//! Given steps for task scheduling BDD scenarios.

use super::world::{SchedulingWorld, run_async};
use eyre::WrapErr;
use mirrorfleet::store::domain::{Agent, AgentKind, AgentName, AgentStatus, AgentUpdate, NewTask};
use rstest_bdd_macros::given;

fn register(world: &SchedulingWorld, name: &str) -> Result<AgentName, eyre::Report> {
    let agent_name = AgentName::new(name)?;
    let agent = Agent::register(agent_name.clone(), AgentKind::Public, world.clock.as_ref());
    run_async(world.repositories.agents.create(&agent)).wrap_err("register agent")?;
    Ok(agent_name)
}

#[given(r#"a running agent "{name}""#)]
fn running_agent(world: &mut SchedulingWorld, name: String) -> Result<(), eyre::Report> {
    register(world, &name)?;
    Ok(())
}

#[given(r#"an unknown agent "{name}""#)]
fn unknown_agent(world: &mut SchedulingWorld, name: String) -> Result<(), eyre::Report> {
    let agent_name = register(world, &name)?;
    run_async(world.repositories.agents.update_by_name(
        &agent_name,
        AgentUpdate::default().with_status(AgentStatus::Unknown, "stopped"),
    ))
    .wrap_err("demote agent")?;
    Ok(())
}

#[given(r#"a pending task "{name}""#)]
fn pending_task(world: &mut SchedulingWorld, name: String) -> Result<(), eyre::Report> {
    let new_task = NewTask::new(name.as_str(), "owner-1", world.registry_id)?;
    let task = run_async(world.repositories.tasks.create(new_task)).wrap_err("create task")?;
    world.tasks.insert(name, task.clone());
    world.last_created = Some(task);
    Ok(())
}
