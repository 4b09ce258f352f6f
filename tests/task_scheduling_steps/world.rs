//! Shared world state for task scheduling BDD scenarios.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use mirrorfleet::clock::FixedClock;
use mirrorfleet::server::{Monitor, Scheduler};
use mirrorfleet::store::adapters::memory;
use mirrorfleet::store::domain::{RegistryId, Task};
use mirrorfleet::store::ports::Repositories;
use rstest::fixture;

/// Scenario world for scheduling behaviour tests.
pub struct SchedulingWorld {
    pub repositories: Repositories,
    pub clock: Arc<FixedClock>,
    pub scheduler: Scheduler,
    pub monitor: Monitor<FixedClock>,
    pub registry_id: RegistryId,
    pub tasks: BTreeMap<String, Task>,
    pub last_created: Option<Task>,
    pub last_assigned: Option<usize>,
}

impl SchedulingWorld {
    /// Creates a world over an empty store.
    #[must_use]
    pub fn new() -> Self {
        let start = Utc
            .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid start time"));
        let clock = Arc::new(FixedClock::at(start));
        let repositories = memory::repositories_with_clock(Arc::clone(&clock));
        Self {
            scheduler: Scheduler::new(
                Arc::clone(&repositories.tasks),
                Arc::clone(&repositories.agents),
                100,
            ),
            monitor: Monitor::with_clock(
                Arc::clone(&repositories.agents),
                Duration::from_secs(300),
                Arc::clone(&clock),
            ),
            repositories,
            clock,
            registry_id: RegistryId::new(1).unwrap_or_else(|err| panic!("valid id: {err}")),
            tasks: BTreeMap::new(),
            last_created: None,
            last_assigned: None,
        }
    }
}

impl Default for SchedulingWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> SchedulingWorld {
    SchedulingWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
