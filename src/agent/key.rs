//! Work queue keys naming one version of one task.

use crate::store::domain::{ResourceVersion, Task, TaskId};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A task id paired with the version discovery saw.
///
/// Encoded as `"<id>/<version>"` on the work queue, so a task that moves to
/// a new version is queued again while an unchanged one is deduplicated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskKey {
    /// Task to reconcile.
    pub id: TaskId,
    /// Version observed at discovery.
    pub version: ResourceVersion,
}

impl TaskKey {
    /// Key for the current version of `task`.
    #[must_use]
    pub const fn of(task: &Task) -> Self {
        Self {
            id: task.id(),
            version: task.resource_version(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.id, self.version)
    }
}

/// Error returned for a key that is not `"<id>/<version>"`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("malformed task key '{key}': {reason}")]
pub struct TaskKeyError {
    /// Rejected key.
    pub key: String,
    /// What is wrong with it.
    pub reason: &'static str,
}

impl TaskKeyError {
    fn new(key: &str, reason: &'static str) -> Self {
        Self {
            key: key.to_owned(),
            reason,
        }
    }
}

impl FromStr for TaskKey {
    type Err = TaskKeyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (id_part, version_part) = raw
            .split_once('/')
            .ok_or_else(|| TaskKeyError::new(raw, "expected <id>/<version>"))?;
        let id_value: i64 = id_part
            .parse()
            .map_err(|_| TaskKeyError::new(raw, "task id is not an integer"))?;
        let version_value: i64 = version_part
            .parse()
            .map_err(|_| TaskKeyError::new(raw, "resource version is not an integer"))?;
        let id = TaskId::new(id_value)
            .map_err(|_| TaskKeyError::new(raw, "task id must be positive"))?;
        if version_value < 1 {
            return Err(TaskKeyError::new(raw, "resource version must be positive"));
        }
        Ok(Self {
            id,
            version: ResourceVersion::new(version_value),
        })
    }
}
