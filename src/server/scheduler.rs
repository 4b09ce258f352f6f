//! Round-robin assignment of unassigned tasks to running agents.

use super::ServerError;
use crate::store::domain::{Agent, AgentName, Task, TaskUpdate};
use crate::store::ports::{AgentRepository, PageRequest, TaskRepository};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, info, warn};

/// Assigns every unassigned task to a running agent.
///
/// Agents are taken in name order and the rotation continues where the
/// previous tick stopped.
pub struct Scheduler {
    tasks: Arc<dyn TaskRepository>,
    agents: Arc<dyn AgentRepository>,
    page_size: usize,
    cursor: Mutex<usize>,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("page_size", &self.page_size)
            .finish_non_exhaustive()
    }
}

impl Scheduler {
    /// Creates a scheduler listing tasks `page_size` at a time.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        agents: Arc<dyn AgentRepository>,
        page_size: usize,
    ) -> Self {
        Self {
            tasks,
            agents,
            page_size: page_size.max(1),
            cursor: Mutex::new(0),
        }
    }

    /// Runs one scheduling pass and returns the number of assignments.
    ///
    /// A task another writer changed first is left alone. Other per-task
    /// failures are logged and the pass continues.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Store`] when the agent roster or a task page
    /// cannot be listed.
    pub async fn tick(&self) -> Result<usize, ServerError> {
        let mut roster: Vec<AgentName> = self
            .agents
            .list()
            .await?
            .iter()
            .filter(|agent| agent.is_running())
            .map(Agent::name)
            .cloned()
            .collect();
        roster.sort();
        if roster.is_empty() {
            debug!("no running agent, nothing scheduled");
            return Ok(0);
        }

        let mut request = PageRequest::first(self.page_size);
        let mut assigned = 0;
        loop {
            let page = self.tasks.list_unassigned(request).await?;
            for task in &page.items {
                if self.assign(task, &roster).await {
                    assigned += 1;
                }
            }
            match page.next {
                Some(cursor) => request = request.after(cursor),
                None => break,
            }
        }
        if assigned > 0 {
            info!(assigned, "tasks scheduled");
        }
        Ok(assigned)
    }

    async fn assign(&self, task: &Task, roster: &[AgentName]) -> bool {
        let slot = self.slot(roster.len());
        let Some(agent) = roster.get(slot) else {
            return false;
        };
        let update = TaskUpdate::assign_to(agent.clone());
        match self
            .tasks
            .update(task.id(), task.resource_version(), update)
            .await
        {
            Ok(_) => {
                debug!(task_id = %task.id(), agent = %agent, "task assigned");
                self.advance(slot);
                true
            }
            Err(err) if err.is_stale() => {
                debug!(task_id = %task.id(), "task changed before assignment");
                false
            }
            Err(err) => {
                warn!(task_id = %task.id(), agent = %agent, error = %err, "assignment failed");
                false
            }
        }
    }

    fn slot(&self, len: usize) -> usize {
        let cursor = *self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        if cursor >= len { 0 } else { cursor }
    }

    fn advance(&self, slot: usize) {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner) = slot.saturating_add(1);
    }
}
