//! In-memory agent repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::store::{
    domain::{Agent, AgentName, AgentUpdate},
    ports::{AgentRepository, StoreError, StoreResult},
};

/// Thread-safe in-memory agent repository keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentRepository {
    agents: Arc<RwLock<BTreeMap<AgentName, Agent>>>,
}

impl InMemoryAgentRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn create(&self, agent: &Agent) -> StoreResult<()> {
        let mut agents = self.agents.write().map_err(lock_error)?;
        if agents.contains_key(agent.name()) {
            return Err(StoreError::Duplicate {
                entity: "agent",
                key: agent.name().to_string(),
            });
        }
        agents.insert(agent.name().clone(), agent.clone());
        Ok(())
    }

    async fn get_by_name(&self, name: &AgentName) -> StoreResult<Option<Agent>> {
        let agents = self.agents.read().map_err(lock_error)?;
        Ok(agents.get(name).cloned())
    }

    async fn list(&self) -> StoreResult<Vec<Agent>> {
        let agents = self.agents.read().map_err(lock_error)?;
        Ok(agents.values().cloned().collect())
    }

    async fn update_by_name(&self, name: &AgentName, update: AgentUpdate) -> StoreResult<Agent> {
        let mut agents = self.agents.write().map_err(lock_error)?;
        let agent = agents
            .get_mut(name)
            .ok_or_else(|| StoreError::not_found("agent", name))?;
        agent.apply(&update);
        Ok(agent.clone())
    }
}
