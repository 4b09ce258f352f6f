//! When steps for task scheduling BDD scenarios.

use super::world::{SchedulingWorld, run_async};
use chrono::Duration;
use eyre::WrapErr;
use rstest_bdd_macros::when;

#[when("the scheduler ticks")]
fn scheduler_ticks(world: &mut SchedulingWorld) -> Result<(), eyre::Report> {
    let assigned = run_async(world.scheduler.tick()).wrap_err("scheduler tick")?;
    world.last_assigned = Some(assigned);
    Ok(())
}

#[when("{minutes:i64} minutes pass without a heartbeat")]
fn minutes_pass(world: &mut SchedulingWorld, minutes: i64) {
    world.clock.advance(Duration::minutes(minutes));
}

#[when("the monitor ticks")]
fn monitor_ticks(world: &mut SchedulingWorld) -> Result<(), eyre::Report> {
    run_async(world.monitor.tick()).wrap_err("monitor tick")?;
    Ok(())
}
