//! Diesel row models for the coordination store.

use super::schema::{agents, images, registries, tasks};
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Owning user.
    pub owner_id: String,
    /// Target registry.
    pub registry_id: i64,
    /// Assigned agent.
    pub agent_name: Option<String>,
    /// Lifecycle status.
    pub status: String,
    /// Optimistic-lock token.
    pub resource_version: i64,
    /// Latest status message.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub modified_at: DateTime<Utc>,
}

/// Insert model for tasks. The id comes from the sequence.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow {
    /// Display name.
    pub name: String,
    /// Owning user.
    pub owner_id: String,
    /// Target registry.
    pub registry_id: i64,
    /// Pinned agent.
    pub agent_name: Option<String>,
    /// Initial status.
    pub status: String,
    /// Initial optimistic-lock token.
    pub resource_version: i64,
    /// Initial message.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub modified_at: DateTime<Utc>,
}

/// Changeset written by a version-checked task update.
///
/// `agent_name: Some(None)` writes `NULL`; `None` leaves the column alone.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = tasks)]
pub struct TaskChangeset {
    /// New assignment.
    pub agent_name: Option<Option<String>>,
    /// New status.
    pub status: Option<String>,
    /// New message.
    pub message: Option<String>,
    /// New display name.
    pub name: Option<String>,
    /// Bumped optimistic-lock token.
    pub resource_version: i64,
    /// Modification timestamp.
    pub modified_at: DateTime<Utc>,
}

/// Row model for agents, used for both reads and inserts.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = agents)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct AgentRow {
    /// Unique agent name.
    pub name: String,
    /// Liveness status.
    pub status: String,
    /// Deployment kind.
    pub kind: String,
    /// Latest status message.
    pub message: String,
    /// Latest heartbeat.
    pub last_heartbeat: DateTime<Utc>,
    /// Registration timestamp.
    pub created_at: DateTime<Utc>,
}

/// Partial agent update.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = agents)]
pub struct AgentChangeset {
    /// New liveness status.
    pub status: Option<String>,
    /// New message.
    pub message: Option<String>,
    /// New heartbeat.
    pub last_heartbeat: Option<DateTime<Utc>>,
}

/// Query result row for registries.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = registries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct RegistryRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Owning user.
    pub owner_id: String,
    /// Registry host.
    pub repository: String,
    /// Namespace under the host.
    pub namespace: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
}

/// Insert model for registries.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = registries)]
pub struct NewRegistryRow {
    /// Owning user.
    pub owner_id: String,
    /// Registry host.
    pub repository: String,
    /// Namespace under the host.
    pub namespace: String,
    /// Login user.
    pub username: String,
    /// Login password.
    pub password: String,
}

/// Query result row for images.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = images)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Owning task.
    pub task_id: i64,
    /// Source reference.
    pub name: String,
    /// Latest outcome.
    pub status: String,
    /// Latest outcome detail.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub modified_at: DateTime<Utc>,
}

/// Insert model for images.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = images)]
pub struct NewImageRow {
    /// Owning task.
    pub task_id: i64,
    /// Source reference.
    pub name: String,
    /// Initial outcome.
    pub status: String,
    /// Initial message.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub modified_at: DateTime<Utc>,
}
