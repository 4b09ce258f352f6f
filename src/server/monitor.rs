//! Liveness monitor demoting agents that stopped heartbeating.

use super::ServerError;
use crate::store::domain::{AGENT_STOPPED_MESSAGE, AgentStatus, AgentUpdate};
use crate::store::ports::AgentRepository;
use chrono::TimeDelta;
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Marks agents `unknown` once their heartbeat is older than the window.
pub struct Monitor<C = DefaultClock> {
    agents: Arc<dyn AgentRepository>,
    window: TimeDelta,
    clock: Arc<C>,
}

impl<C> std::fmt::Debug for Monitor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Monitor")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Monitor {
    /// Creates a monitor using the system clock.
    #[must_use]
    pub fn new(agents: Arc<dyn AgentRepository>, window: Duration) -> Self {
        Self::with_clock(agents, window, Arc::new(DefaultClock))
    }
}

impl<C: Clock + Send + Sync> Monitor<C> {
    /// Creates a monitor reading time from `clock`.
    #[must_use]
    pub fn with_clock(agents: Arc<dyn AgentRepository>, window: Duration, clock: Arc<C>) -> Self {
        Self {
            agents,
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            clock,
        }
    }

    /// Runs one liveness pass and returns the number of demoted agents.
    ///
    /// Agents already `unknown` are never written.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Store`] when the agents cannot be listed.
    pub async fn tick(&self) -> Result<usize, ServerError> {
        let now = self.clock.utc();
        let mut demoted = 0;
        for agent in self.agents.list().await? {
            if agent.status() == AgentStatus::Unknown
                || !agent.heartbeat_expired(now, self.window)
            {
                continue;
            }
            let update =
                AgentUpdate::default().with_status(AgentStatus::Unknown, AGENT_STOPPED_MESSAGE);
            match self.agents.update_by_name(agent.name(), update).await {
                Ok(_) => {
                    info!(
                        agent = %agent.name(),
                        last_heartbeat = %agent.last_heartbeat(),
                        "agent stopped posting status"
                    );
                    demoted += 1;
                }
                Err(err) => warn!(agent = %agent.name(), error = %err, "failed to demote agent"),
            }
        }
        Ok(demoted)
    }
}
