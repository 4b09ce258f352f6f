//! Runs the scheduler and monitor loops until cancelled.

use super::{Monitor, Scheduler};
use crate::config::ServerSettings;
use crate::store::ports::Repositories;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns the scheduling and liveness loops of the server.
pub struct ServerController<C = DefaultClock> {
    scheduler: Scheduler,
    monitor: Monitor<C>,
    schedule_interval: Duration,
    monitor_interval: Duration,
}

impl<C> std::fmt::Debug for ServerController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerController")
            .field("schedule_interval", &self.schedule_interval)
            .field("monitor_interval", &self.monitor_interval)
            .finish_non_exhaustive()
    }
}

impl ServerController {
    /// Creates a controller using the system clock.
    #[must_use]
    pub fn new(settings: &ServerSettings, repositories: &Repositories) -> Self {
        Self::with_clock(settings, repositories, Arc::new(DefaultClock))
    }
}

impl<C: Clock + Send + Sync + 'static> ServerController<C> {
    /// Creates a controller whose monitor reads time from `clock`.
    #[must_use]
    pub fn with_clock(
        settings: &ServerSettings,
        repositories: &Repositories,
        clock: Arc<C>,
    ) -> Self {
        Self {
            scheduler: Scheduler::new(
                Arc::clone(&repositories.tasks),
                Arc::clone(&repositories.agents),
                settings.page_size,
            ),
            monitor: Monitor::with_clock(
                Arc::clone(&repositories.agents),
                settings.liveness_window,
                clock,
            ),
            schedule_interval: settings.schedule_interval,
            monitor_interval: settings.monitor_interval,
        }
    }

    /// Returns the scheduler.
    #[must_use]
    pub const fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Returns the liveness monitor.
    #[must_use]
    pub const fn monitor(&self) -> &Monitor<C> {
        &self.monitor
    }

    /// Runs both loops until `cancel` fires. A failed tick is logged and
    /// the next one proceeds.
    pub async fn run(&self, cancel: &CancellationToken) {
        info!(
            schedule_interval = ?self.schedule_interval,
            monitor_interval = ?self.monitor_interval,
            "starting server loops"
        );
        tokio::join!(
            self.schedule_loop(cancel),
            self.monitor_loop(cancel)
        );
        info!("server loops stopped");
    }

    async fn schedule_loop(&self, cancel: &CancellationToken) {
        let mut ticker = interval(self.schedule_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => match self.scheduler.tick().await {
                    Ok(assigned) => debug!(assigned, "schedule tick"),
                    Err(err) => warn!(error = %err, "schedule tick failed"),
                },
            }
        }
    }

    async fn monitor_loop(&self, cancel: &CancellationToken) {
        let mut ticker = interval(self.monitor_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => match self.monitor.tick().await {
                    Ok(demoted) => debug!(demoted, "monitor tick"),
                    Err(err) => warn!(error = %err, "monitor tick failed"),
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ServerController;
    use crate::config::ServerSettings;
    use crate::store::adapters::memory;
    use crate::store::domain::{Agent, AgentKind, AgentName, NewTask, RegistryId, TaskStatus};
    use mockable::DefaultClock;
    use rstest::rstest;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    #[rstest]
    #[tokio::test(flavor = "multi_thread")]
    async fn loops_schedule_until_cancelled() {
        let repositories = memory::repositories();
        repositories
            .agents
            .create(&Agent::register(
                AgentName::new("edge-1").expect("name"),
                AgentKind::Public,
                &DefaultClock,
            ))
            .await
            .expect("create agent");
        let task = repositories
            .tasks
            .create(
                NewTask::new("nginx", "owner-1", RegistryId::new(1).expect("id")).expect("task"),
            )
            .await
            .expect("create task");
        let settings = ServerSettings {
            schedule_interval: Duration::from_millis(10),
            ..ServerSettings::default()
        };
        let controller = ServerController::new(&settings, &repositories);
        let cancel = CancellationToken::new();

        let stopper = cancel.clone();
        let waiter = async {
            tokio::time::timeout(Duration::from_secs(5), async {
                loop {
                    let stored = repositories.tasks.get(task.id()).await.expect("get");
                    if stored.status() == TaskStatus::Assigned {
                        break;
                    }
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
            })
            .await
            .expect("task assigned");
            stopper.cancel();
        };
        tokio::join!(controller.run(&cancel), waiter);
    }
}
