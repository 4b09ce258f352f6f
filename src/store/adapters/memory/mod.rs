//! In-memory store adapters for tests and single-process deployments.

mod agent;
mod image;
mod registry;
mod task;

pub use agent::InMemoryAgentRepository;
pub use image::InMemoryImageRepository;
pub use registry::InMemoryRegistryRepository;
pub use task::InMemoryTaskRepository;

use crate::store::ports::{Repositories, StoreError};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// Fresh in-memory repositories stamped by the system clock.
#[must_use]
pub fn repositories() -> Repositories {
    repositories_with_clock(Arc::new(DefaultClock))
}

/// Fresh in-memory repositories stamped by `clock`.
#[must_use]
pub fn repositories_with_clock<C: Clock + Send + Sync + 'static>(clock: Arc<C>) -> Repositories {
    let tasks = InMemoryTaskRepository::with_clock(clock);
    let images = tasks.images();
    Repositories {
        tasks: Arc::new(tasks),
        agents: Arc::new(InMemoryAgentRepository::new()),
        registries: Arc::new(InMemoryRegistryRepository::new()),
        images: Arc::new(images),
    }
}

fn lock_error<T>(err: std::sync::PoisonError<T>) -> StoreError {
    StoreError::persistence(std::io::Error::other(err.to_string()))
}
