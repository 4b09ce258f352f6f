//! Agent process: registration, heartbeat, discovery and the worker pool.

use super::{AgentError, SyncOutcome, TaskKey, TaskReconciler};
use crate::config::AgentSettings;
use crate::queue::{DoneGuard, WorkQueue};
use crate::store::domain::{
    AGENT_STARTED_MESSAGE, Agent, AgentKind, AgentName, AgentStatus, AgentUpdate,
    StoreDomainError, TaskStatus,
};
use crate::store::ports::{DEFAULT_PAGE_SIZE, PageRequest, Repositories, StoreError};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Identity, pool size and loop periods of an agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentOptions {
    /// Unique agent name.
    pub name: AgentName,
    /// Number of concurrent workers.
    pub workers: usize,
    /// Period of the heartbeat loop.
    pub heartbeat_interval: Duration,
    /// Period of the discovery loop.
    pub discovery_interval: Duration,
    /// Rate-limited retries before a failing key is dropped.
    pub max_retries: u32,
    /// Page size used by discovery.
    pub page_size: usize,
}

impl AgentOptions {
    /// Options with the default pool size and periods.
    #[must_use]
    pub const fn new(name: AgentName) -> Self {
        Self {
            name,
            workers: 5,
            heartbeat_interval: Duration::from_secs(60),
            discovery_interval: Duration::from_secs(5),
            max_retries: 5,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Builds options from the `agent` settings section.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Config`] when the name is empty or invalid.
    pub fn from_settings(settings: &AgentSettings, page_size: usize) -> Result<Self, AgentError> {
        let name = AgentName::new(settings.name.as_str()).map_err(|err| match err {
            StoreDomainError::EmptyAgentName => {
                AgentError::Config("agent name must be set".to_owned())
            }
            other => AgentError::Config(other.to_string()),
        })?;
        Ok(Self {
            name,
            workers: settings.workers.max(1),
            heartbeat_interval: settings.heartbeat_interval,
            discovery_interval: settings.discovery_interval,
            max_retries: settings.max_retries,
            page_size: page_size.max(1),
        })
    }
}

/// Runs one agent against the shared store.
pub struct AgentController<C = DefaultClock> {
    options: AgentOptions,
    repositories: Repositories,
    reconciler: TaskReconciler,
    queue: WorkQueue<String>,
    clock: Arc<C>,
}

impl<C> std::fmt::Debug for AgentController<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentController")
            .field("options", &self.options)
            .field("queue", &self.queue)
            .finish_non_exhaustive()
    }
}

impl AgentController {
    /// Creates a controller using the system clock.
    #[must_use]
    pub fn new(
        options: AgentOptions,
        repositories: Repositories,
        reconciler: TaskReconciler,
    ) -> Self {
        Self::with_clock(options, repositories, reconciler, Arc::new(DefaultClock))
    }
}

impl<C: Clock + Send + Sync + 'static> AgentController<C> {
    /// Creates a controller reading time from `clock`.
    #[must_use]
    pub fn with_clock(
        options: AgentOptions,
        repositories: Repositories,
        reconciler: TaskReconciler,
        clock: Arc<C>,
    ) -> Self {
        Self {
            options,
            repositories,
            reconciler,
            queue: WorkQueue::default(),
            clock,
        }
    }

    /// Returns the work queue shared by discovery and the workers.
    #[must_use]
    pub const fn queue(&self) -> &WorkQueue<String> {
        &self.queue
    }

    /// Creates the agent row unless one already exists.
    ///
    /// Returns `true` when a row was created.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Store`] when the store cannot be reached.
    pub async fn register_if_absent(&self) -> Result<bool, AgentError> {
        let agents = &self.repositories.agents;
        if agents.get_by_name(&self.options.name).await?.is_some() {
            return Ok(false);
        }
        let agent = Agent::register(
            self.options.name.clone(),
            AgentKind::Public,
            self.clock.as_ref(),
        );
        match agents.create(&agent).await {
            Ok(()) => {
                info!(agent = %self.options.name, "agent registered");
                Ok(true)
            }
            Err(StoreError::Duplicate { .. }) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    /// Refreshes the heartbeat, flipping an `unknown` agent back to `running`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Store`] when the row is missing or the store
    /// fails.
    pub async fn heartbeat_once(&self) -> Result<(), AgentError> {
        let name = &self.options.name;
        let agent = self
            .repositories
            .agents
            .get_by_name(name)
            .await?
            .ok_or_else(|| StoreError::not_found("agent", name))?;
        let refresh = AgentUpdate::heartbeat(self.clock.utc());
        let update = if agent.status() == AgentStatus::Unknown {
            info!(agent = %name, "agent resumed posting status");
            refresh.with_status(AgentStatus::Running, AGENT_STARTED_MESSAGE)
        } else {
            refresh
        };
        self.repositories.agents.update_by_name(name, update).await?;
        Ok(())
    }

    /// Queues a key for every task waiting for this agent.
    ///
    /// Returns the number of keys added. Keys already queued are
    /// deduplicated by the queue.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError::Store`] when a listing fails.
    pub async fn discover_once(&self) -> Result<usize, AgentError> {
        let mut request = PageRequest::first(self.options.page_size);
        let mut found = 0;
        loop {
            let page = self
                .repositories
                .tasks
                .list_assigned_to(&self.options.name, &[TaskStatus::Assigned], request)
                .await?;
            for task in &page.items {
                self.queue.add(TaskKey::of(task).to_string());
            }
            found += page.items.len();
            match page.next {
                Some(cursor) => request = request.after(cursor),
                None => break,
            }
        }
        debug!(agent = %self.options.name, found, "discovery finished");
        Ok(found)
    }

    /// Takes one key from the queue and reconciles it.
    ///
    /// Returns `false` once the queue is shut down.
    #[must_use]
    pub async fn process_next(&self) -> bool {
        let Some(key) = self.queue.get().await else {
            return false;
        };
        let guard = DoneGuard::new(self.queue.clone(), key);
        self.process(&guard).await;
        true
    }

    async fn process(&self, guard: &DoneGuard<String>) {
        let raw = guard.key();
        let key = match raw.parse::<TaskKey>() {
            Ok(key) => key,
            Err(err) => {
                warn!(key = %raw, error = %err, "dropping malformed key");
                self.queue.forget(raw);
                return;
            }
        };
        match self.reconciler.sync(key).await {
            Ok(outcome) => {
                if outcome == SyncOutcome::Skipped {
                    debug!(key = %raw, "key skipped");
                }
                self.queue.forget(raw);
            }
            Err(err) => {
                let retries = self.queue.num_requeues(raw);
                if retries < self.options.max_retries {
                    warn!(key = %raw, retries, error = %err, "reconcile failed, requeueing");
                    self.queue.add_rate_limited(raw.clone());
                } else {
                    warn!(key = %raw, retries, error = %err, "reconcile failed, dropping key");
                    self.queue.forget(raw);
                }
            }
        }
    }

    /// Registers the agent and runs heartbeat, discovery and the workers
    /// until `cancel` fires.
    ///
    /// In-flight reconciles are dropped on cancellation. Their keys are
    /// released and the tasks stay `assigned` for the next start.
    ///
    /// # Errors
    ///
    /// Returns [`AgentError`] only when registration fails. Loop failures
    /// are logged and the loops continue.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) -> Result<(), AgentError> {
        self.register_if_absent().await?;
        info!(agent = %self.options.name, workers = self.options.workers, "starting agent");

        let mut loops = JoinSet::new();
        loops.spawn(Arc::clone(&self).heartbeat_loop(cancel.clone()));
        loops.spawn(Arc::clone(&self).discovery_loop(cancel.clone()));
        for _ in 0..self.options.workers {
            loops.spawn(Arc::clone(&self).worker_loop(cancel.clone()));
        }

        cancel.cancelled_owned().await;
        self.queue.shut_down();
        while let Some(joined) = loops.join_next().await {
            if let Err(err) = joined {
                warn!(error = %err, "agent loop ended abnormally");
            }
        }
        info!(agent = %self.options.name, "agent stopped");
        Ok(())
    }

    async fn heartbeat_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = interval(self.options.heartbeat_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stopped = cancel.cancelled_owned();
        tokio::pin!(stopped);
        loop {
            tokio::select! {
                () = &mut stopped => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.heartbeat_once().await {
                        warn!(agent = %self.options.name, error = %err, "heartbeat failed");
                    }
                }
            }
        }
    }

    async fn discovery_loop(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = interval(self.options.discovery_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let stopped = cancel.cancelled_owned();
        tokio::pin!(stopped);
        loop {
            tokio::select! {
                () = &mut stopped => break,
                _ = ticker.tick() => {
                    if let Err(err) = self.discover_once().await {
                        warn!(agent = %self.options.name, error = %err, "discovery failed");
                    }
                }
            }
        }
    }

    async fn worker_loop(self: Arc<Self>, cancel: CancellationToken) {
        let stopped = cancel.cancelled_owned();
        tokio::pin!(stopped);
        while let Some(key) = self.queue.get().await {
            let guard = DoneGuard::new(self.queue.clone(), key);
            tokio::select! {
                biased;
                () = &mut stopped => {
                    debug!(key = %guard.key(), "reconcile abandoned on shutdown");
                    break;
                }
                () = self.process(&guard) => {}
            }
        }
    }
}
