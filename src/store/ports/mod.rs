//! Port contracts for the coordination store.
//!
//! The store is the single source of truth shared by the server and every
//! agent. Components receive only the repositories they need, as
//! `Arc<dyn …>` handles.

pub mod agent;
pub mod error;
pub mod image;
pub mod page;
pub mod registry;
pub mod repositories;
pub mod task;

pub use agent::AgentRepository;
pub use error::{StoreError, StoreResult};
pub use image::ImageRepository;
pub use page::{DEFAULT_PAGE_SIZE, Page, PageRequest};
pub use registry::RegistryRepository;
pub use repositories::Repositories;
pub use task::TaskRepository;

#[cfg(test)]
pub use agent::MockAgentRepository;
#[cfg(test)]
pub use image::MockImageRepository;
#[cfg(test)]
pub use registry::MockRegistryRepository;
#[cfg(test)]
pub use task::MockTaskRepository;
