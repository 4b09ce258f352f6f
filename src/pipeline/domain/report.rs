//! Status reports sent by the plugin runner.

use crate::store::domain::{ImageStatus, TaskStatus};
use serde::{Deserialize, Serialize};

/// Outcome of one image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReport {
    /// Task the image belongs to.
    pub task_id: i64,
    /// Source image reference.
    pub name: String,
    /// Outcome.
    pub status: ImageStatus,
    /// Failure detail, empty on success.
    pub message: String,
}

/// Outcome of a whole run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskReport {
    /// Reported task.
    pub task_id: i64,
    /// Terminal status.
    pub status: TaskStatus,
    /// Failure detail, empty on success.
    pub message: String,
}
