//! Bundle of every store port, handed to the coordinators.

use super::{AgentRepository, ImageRepository, RegistryRepository, TaskRepository};
use std::sync::Arc;

/// Shared handles to the four repositories of one store.
#[derive(Clone)]
pub struct Repositories {
    /// Task rows.
    pub tasks: Arc<dyn TaskRepository>,
    /// Agent liveness rows.
    pub agents: Arc<dyn AgentRepository>,
    /// Push destinations.
    pub registries: Arc<dyn RegistryRepository>,
    /// Per-task image rows.
    pub images: Arc<dyn ImageRepository>,
}

impl std::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
