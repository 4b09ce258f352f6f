//! Repository port for per-task image rows.

use super::StoreResult;
use crate::store::domain::{Image, ImageName, ImageStatus, TaskId};
use async_trait::async_trait;

/// Image persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Creates one pending row per name for `task_id`.
    async fn create_for_task(&self, task_id: TaskId, names: &[ImageName])
    -> StoreResult<Vec<Image>>;

    /// Lists the rows of a task in creation order.
    async fn list_for_task(&self, task_id: TaskId) -> StoreResult<Vec<Image>>;

    /// Records a pipeline outcome for the named image of a task.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the task has no such
    /// image.
    async fn update_status(
        &self,
        task_id: TaskId,
        name: &ImageName,
        status: ImageStatus,
        message: &str,
    ) -> StoreResult<Image>;
}
