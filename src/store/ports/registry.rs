//! Repository port for target registries.

use super::StoreResult;
use crate::store::domain::{NewRegistry, Registry, RegistryId};
use async_trait::async_trait;

/// Registry persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RegistryRepository: Send + Sync {
    /// Stores a registry and returns it with its assigned id.
    async fn create(&self, registry: NewRegistry) -> StoreResult<Registry>;

    /// Reads a registry.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the id is absent.
    async fn get(&self, id: RegistryId) -> StoreResult<Registry>;
}
