//! Repository port for agent liveness records.

use super::StoreResult;
use crate::store::domain::{Agent, AgentName, AgentUpdate};
use async_trait::async_trait;

/// Agent persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Stores a newly registered agent.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::Duplicate`] when the name is taken.
    async fn create(&self, agent: &Agent) -> StoreResult<()>;

    /// Finds an agent by name.
    async fn get_by_name(&self, name: &AgentName) -> StoreResult<Option<Agent>>;

    /// Lists every agent, ordered by name.
    async fn list(&self) -> StoreResult<Vec<Agent>>;

    /// Applies a partial update to the named agent.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the agent is absent.
    async fn update_by_name(&self, name: &AgentName, update: AgentUpdate) -> StoreResult<Agent>;
}
