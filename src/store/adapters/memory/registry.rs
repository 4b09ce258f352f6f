//! In-memory registry repository.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::store::{
    domain::{NewRegistry, Registry, RegistryId},
    ports::{RegistryRepository, StoreError, StoreResult},
};

/// Thread-safe in-memory registry repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRegistryRepository {
    state: Arc<RwLock<InMemoryRegistryState>>,
}

#[derive(Debug, Default)]
struct InMemoryRegistryState {
    registries: BTreeMap<RegistryId, Registry>,
    last_id: i64,
}

impl InMemoryRegistryRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistryRepository for InMemoryRegistryRepository {
    async fn create(&self, registry: NewRegistry) -> StoreResult<Registry> {
        let mut state = self.state.write().map_err(lock_error)?;
        let next = state.last_id + 1;
        let id = RegistryId::new(next).map_err(StoreError::persistence)?;
        let created = Registry::from_new(id, registry);
        state.last_id = next;
        state.registries.insert(id, created.clone());
        Ok(created)
    }

    async fn get(&self, id: RegistryId) -> StoreResult<Registry> {
        let state = self.state.read().map_err(lock_error)?;
        state
            .registries
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("registry", id))
    }
}
