//! Shared fixtures for in-memory integration tests.

use chrono::{TimeZone, Utc};
use mirrorfleet::agent::{AgentController, AgentOptions, TaskReconciler};
use mirrorfleet::clock::FixedClock;
use mirrorfleet::delivery::adapters::RecordingDelivery;
use mirrorfleet::server::{Monitor, Scheduler};
use mirrorfleet::store::adapters::memory;
use mirrorfleet::store::domain::{AgentName, NewRegistry, Registry};
use mirrorfleet::store::ports::Repositories;
use mirrorfleet::store::services::TaskService;
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

/// Callback URL written into rendered configs.
pub const CALLBACK: &str = "http://mirrorfleet.internal:8090";

/// A whole fleet wired against one in-memory store.
pub struct Fleet {
    pub repositories: Repositories,
    pub clock: Arc<FixedClock>,
    pub service: TaskService,
    pub scheduler: Scheduler,
    pub monitor: Monitor<FixedClock>,
    pub delivery: RecordingDelivery,
    pub agent: Arc<AgentController<FixedClock>>,
}

impl Fleet {
    /// Stores the registry every test pushes to.
    ///
    /// # Errors
    ///
    /// Returns an error when the registry cannot be stored.
    pub async fn registry(&self) -> Result<Registry, eyre::Report> {
        let registry = NewRegistry::new("owner-1", "harbor.example.com", "mirror")?
            .with_credentials("robot", "s3cret");
        Ok(self.service.create_registry(registry).await?)
    }
}

/// Name of the agent in the fleet.
#[must_use]
pub fn agent_name() -> AgentName {
    AgentName::new("edge-1").unwrap_or_else(|err| panic!("valid agent name: {err}"))
}

/// Provides a fleet with one agent and a clock frozen at a fixed instant.
#[fixture]
pub fn fleet() -> Fleet {
    let start = Utc
        .with_ymd_and_hms(2026, 3, 1, 12, 0, 0)
        .single()
        .unwrap_or_else(|| panic!("valid start time"));
    let clock = Arc::new(FixedClock::at(start));
    let repositories = memory::repositories_with_clock(Arc::clone(&clock));
    let service = TaskService::new(
        Arc::clone(&repositories.tasks),
        Arc::clone(&repositories.registries),
        Arc::clone(&repositories.images),
    );
    let delivery = RecordingDelivery::new();
    let reconciler = TaskReconciler::new(
        agent_name(),
        CALLBACK,
        repositories.clone(),
        Arc::new(delivery.clone()),
    );
    let agent = Arc::new(AgentController::with_clock(
        AgentOptions::new(agent_name()),
        repositories.clone(),
        reconciler,
        Arc::clone(&clock),
    ));
    Fleet {
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
        service,
        delivery,
        agent,
    }
}
