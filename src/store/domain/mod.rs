//! Domain model for the coordination store.
//!
//! Tasks, agents, registries and images as seen by the server and agent
//! coordinators. Persistence concerns stay behind the ports in
//! [`crate::store::ports`].

mod agent;
mod error;
mod ids;
mod image;
mod registry;
mod task;

pub use agent::{
    AGENT_STARTED_MESSAGE, AGENT_STOPPED_MESSAGE, Agent, AgentKind, AgentStatus, AgentUpdate,
    PersistedAgentData,
};
pub use error::{ParseStatusError, StoreDomainError};
pub use ids::{AgentName, ImageId, RegistryId, ResourceVersion, TaskId};
pub use image::{Image, ImageName, ImageStatus, PersistedImageData};
pub use registry::{NewRegistry, PersistedRegistryData, Registry};
pub use task::{NewTask, PersistedTaskData, Task, TaskStatus, TaskUpdate};
