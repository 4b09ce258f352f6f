//! Task aggregate and its optimistic-concurrency update model.

use super::{AgentName, ParseStatusError, RegistryId, ResourceVersion, StoreDomainError, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Created and waiting for the scheduler.
    Pending,
    /// Assigned to an agent and waiting for pickup.
    Assigned,
    /// Execution configuration delivered; the pipeline is running.
    Running,
    /// Every image was mirrored.
    Succeeded,
    /// The pipeline reported a failure.
    Failed,
}

impl TaskStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
            Self::Running => "running",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }

    /// Returns `true` for states no coordinator loop acts on again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            "running" => Ok(Self::Running),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseStatusError::new("task status", value)),
        }
    }
}

/// Mirroring task owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    id: TaskId,
    name: String,
    owner_id: String,
    registry_id: RegistryId,
    agent_name: Option<AgentName>,
    status: TaskStatus,
    resource_version: ResourceVersion,
    message: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted identifier.
    pub id: TaskId,
    /// Persisted display name.
    pub name: String,
    /// Persisted owner.
    pub owner_id: String,
    /// Persisted target registry.
    pub registry_id: RegistryId,
    /// Persisted assignment, if any.
    pub agent_name: Option<AgentName>,
    /// Persisted lifecycle status.
    pub status: TaskStatus,
    /// Persisted optimistic-lock token.
    pub resource_version: ResourceVersion,
    /// Persisted status message.
    pub message: String,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Persisted modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            name: data.name,
            owner_id: data.owner_id,
            registry_id: data.registry_id,
            agent_name: data.agent_name,
            status: data.status,
            resource_version: data.resource_version,
            message: data.message,
            created_at: data.created_at,
            modified_at: data.modified_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning user identifier.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the target registry reference.
    #[must_use]
    pub const fn registry_id(&self) -> RegistryId {
        self.registry_id
    }

    /// Returns the assigned agent, if any.
    #[must_use]
    pub const fn agent_name(&self) -> Option<&AgentName> {
        self.agent_name.as_ref()
    }

    /// Returns the lifecycle status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the optimistic-lock token read with this row.
    #[must_use]
    pub const fn resource_version(&self) -> ResourceVersion {
        self.resource_version
    }

    /// Returns the latest status message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the modification timestamp.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Returns `true` when the scheduler may assign this task.
    #[must_use]
    pub const fn is_unassigned(&self) -> bool {
        self.agent_name.is_none()
    }

    /// Returns `true` when `agent` should pick this task up.
    #[must_use]
    pub fn awaits_pickup_by(&self, agent: &AgentName) -> bool {
        self.status == TaskStatus::Assigned && self.agent_name.as_ref() == Some(agent)
    }

    /// Applies an accepted update, bumping the version and modification time.
    ///
    /// Stores call this only after the version check succeeded.
    pub fn apply(&mut self, update: &TaskUpdate, now: DateTime<Utc>) {
        if let Some(agent_name) = &update.agent_name {
            self.agent_name.clone_from(agent_name);
        }
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(message) = &update.message {
            message.clone_into(&mut self.message);
        }
        if let Some(name) = &update.name {
            name.clone_into(&mut self.name);
        }
        self.resource_version = self.resource_version.next();
        self.modified_at = now;
    }
}

/// Validated input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    name: String,
    owner_id: String,
    registry_id: RegistryId,
    agent_name: Option<AgentName>,
}

impl NewTask {
    /// Creates a new unassigned task description.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::EmptyTaskName`] when the name is blank.
    pub fn new(
        name: impl Into<String>,
        owner_id: impl Into<String>,
        registry_id: RegistryId,
    ) -> Result<Self, StoreDomainError> {
        let raw = name.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreDomainError::EmptyTaskName);
        }
        Ok(Self {
            name: trimmed.to_owned(),
            owner_id: owner_id.into(),
            registry_id,
            agent_name: None,
        })
    }

    /// Pins the task to an agent at creation time, bypassing the scheduler.
    #[must_use]
    pub fn with_agent(mut self, agent_name: AgentName) -> Self {
        self.agent_name = Some(agent_name);
        self
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning user identifier.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the target registry reference.
    #[must_use]
    pub const fn registry_id(&self) -> RegistryId {
        self.registry_id
    }

    /// Returns the pinned agent, if any.
    #[must_use]
    pub const fn agent_name(&self) -> Option<&AgentName> {
        self.agent_name.as_ref()
    }

    /// Status the task starts in.
    #[must_use]
    pub const fn initial_status(&self) -> TaskStatus {
        if self.agent_name.is_some() {
            TaskStatus::Assigned
        } else {
            TaskStatus::Pending
        }
    }

    /// Materialises the stored row for the given store-assigned id.
    #[must_use]
    pub fn into_task(self, id: TaskId, now: DateTime<Utc>) -> Task {
        let status = self.initial_status();
        Task {
            id,
            name: self.name,
            owner_id: self.owner_id,
            registry_id: self.registry_id,
            agent_name: self.agent_name,
            status,
            resource_version: ResourceVersion::INITIAL,
            message: String::new(),
            created_at: now,
            modified_at: now,
        }
    }
}

/// Caller-supplied fields of a version-checked task update.
///
/// `None` fields are left untouched. `agent_name: Some(None)` clears the
/// assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    /// New assignment.
    pub agent_name: Option<Option<AgentName>>,
    /// New lifecycle status.
    pub status: Option<TaskStatus>,
    /// New status message.
    pub message: Option<String>,
    /// New display name.
    pub name: Option<String>,
}

impl TaskUpdate {
    /// Update written by the scheduler when it assigns a task.
    #[must_use]
    pub fn assign_to(agent_name: AgentName) -> Self {
        Self {
            agent_name: Some(Some(agent_name)),
            status: Some(TaskStatus::Assigned),
            ..Self::default()
        }
    }

    /// Update that moves the task to `status` with an explanatory message.
    #[must_use]
    pub fn status(status: TaskStatus, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: Some(message.into()),
            ..Self::default()
        }
    }
}
