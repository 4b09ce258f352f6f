//! `PostgreSQL` adapters for the coordination store.

mod models;
mod repository;
mod schema;

pub use repository::{
    PostgresAgentRepository, PostgresImageRepository, PostgresRegistryRepository,
    PostgresTaskRepository, StorePgPool, build_pool,
};

use crate::store::ports::Repositories;
use std::sync::Arc;

/// Repositories sharing one connection pool.
#[must_use]
pub fn repositories(pool: &StorePgPool) -> Repositories {
    Repositories {
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        agents: Arc::new(PostgresAgentRepository::new(pool.clone())),
        registries: Arc::new(PostgresRegistryRepository::new(pool.clone())),
        images: Arc::new(PostgresImageRepository::new(pool.clone())),
    }
}
