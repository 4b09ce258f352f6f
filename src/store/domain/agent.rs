//! Agent liveness records.

use super::{AgentName, ParseStatusError};
use chrono::{DateTime, Duration, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Message written when an agent registers or resumes heartbeating.
pub const AGENT_STARTED_MESSAGE: &str = "Agent started posting status";

/// Message written when the monitor demotes a silent agent.
pub const AGENT_STOPPED_MESSAGE: &str = "Agent stopped posting status";

/// Liveness status of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentStatus {
    /// No heartbeat has been seen within the liveness window.
    Unknown,
    /// The agent is heartbeating and may receive tasks.
    Running,
}

impl AgentStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Running => "running",
        }
    }
}

impl fmt::Display for AgentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for AgentStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "unknown" => Ok(Self::Unknown),
            "running" => Ok(Self::Running),
            _ => Err(ParseStatusError::new("agent status", value)),
        }
    }
}

/// Deployment kind of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentKind {
    /// Shared agent that serves any owner.
    Public,
    /// Agent dedicated to a single owner.
    Private,
}

impl AgentKind {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl TryFrom<&str> for AgentKind {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            _ => Err(ParseStatusError::new("agent kind", value)),
        }
    }
}

/// Agent liveness record keyed by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    name: AgentName,
    status: AgentStatus,
    kind: AgentKind,
    message: String,
    last_heartbeat: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedAgentData {
    /// Persisted agent name.
    pub name: AgentName,
    /// Persisted liveness status.
    pub status: AgentStatus,
    /// Persisted deployment kind.
    pub kind: AgentKind,
    /// Persisted status message.
    pub message: String,
    /// Persisted latest heartbeat.
    pub last_heartbeat: DateTime<Utc>,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Agent {
    /// Creates the record written when an agent registers for the first time.
    #[must_use]
    pub fn register(name: AgentName, kind: AgentKind, clock: &impl Clock) -> Self {
        let now = clock.utc();
        Self {
            name,
            status: AgentStatus::Running,
            kind,
            message: AGENT_STARTED_MESSAGE.to_owned(),
            last_heartbeat: now,
            created_at: now,
        }
    }

    /// Reconstructs an agent from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedAgentData) -> Self {
        Self {
            name: data.name,
            status: data.status,
            kind: data.kind,
            message: data.message,
            last_heartbeat: data.last_heartbeat,
            created_at: data.created_at,
        }
    }

    /// Returns the agent name.
    #[must_use]
    pub const fn name(&self) -> &AgentName {
        &self.name
    }

    /// Returns the liveness status.
    #[must_use]
    pub const fn status(&self) -> AgentStatus {
        self.status
    }

    /// Returns the deployment kind.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Returns the latest status message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the time of the latest recorded heartbeat.
    #[must_use]
    pub const fn last_heartbeat(&self) -> DateTime<Utc> {
        self.last_heartbeat
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns `true` when the agent is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.status == AgentStatus::Running
    }

    /// Returns `true` when the last heartbeat is older than `window` at `now`.
    #[must_use]
    pub fn heartbeat_expired(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.last_heartbeat) > window
    }

    /// Applies a partial update in place.
    pub fn apply(&mut self, update: &AgentUpdate) {
        if let Some(status) = update.status {
            self.status = status;
        }
        if let Some(message) = &update.message {
            message.clone_into(&mut self.message);
        }
        if let Some(heartbeat) = update.last_heartbeat {
            self.last_heartbeat = heartbeat;
        }
    }
}

/// Partial update written to an agent row.
///
/// `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentUpdate {
    /// New liveness status.
    pub status: Option<AgentStatus>,
    /// New status message.
    pub message: Option<String>,
    /// New heartbeat timestamp.
    pub last_heartbeat: Option<DateTime<Utc>>,
}

impl AgentUpdate {
    /// Update that only refreshes the heartbeat.
    #[must_use]
    pub const fn heartbeat(at: DateTime<Utc>) -> Self {
        Self {
            status: None,
            message: None,
            last_heartbeat: Some(at),
        }
    }

    /// Adds a status transition with an explanatory message.
    #[must_use]
    pub fn with_status(mut self, status: AgentStatus, message: impl Into<String>) -> Self {
        self.status = Some(status);
        self.message = Some(message.into());
        self
    }

    /// Returns `true` when the update carries no field.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.status.is_none() && self.message.is_none() && self.last_heartbeat.is_none()
    }
}
