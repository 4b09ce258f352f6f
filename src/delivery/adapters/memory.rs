//! In-memory config delivery for tests and dry runs.

use crate::delivery::ports::{ConfigDelivery, DeliveryError};
use crate::exec::ToolError;
use crate::store::domain::TaskId;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};

/// [`ConfigDelivery`] that keeps every delivered document.
#[derive(Debug, Clone, Default)]
pub struct RecordingDelivery {
    delivered: Arc<Mutex<Vec<(TaskId, String)>>>,
    failing: bool,
}

impl RecordingDelivery {
    /// Creates a delivery that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a delivery that rejects everything.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Returns the deliveries made so far, oldest first.
    #[must_use]
    pub fn delivered(&self) -> Vec<(TaskId, String)> {
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl ConfigDelivery for RecordingDelivery {
    async fn deliver(&self, task_id: TaskId, config_yaml: &str) -> Result<(), DeliveryError> {
        if self.failing {
            return Err(DeliveryError::Tool(ToolError::Failed {
                command: format!("git push -f origin {task_id}"),
                status: Some(128),
                output: "remote unavailable".to_owned(),
            }));
        }
        self.delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((task_id, config_yaml.to_owned()));
        Ok(())
    }
}
