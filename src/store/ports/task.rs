//! Repository port for tasks with version-checked mutation.

use super::{Page, PageRequest, StoreResult};
use crate::store::domain::{
    AgentName, Image, ImageName, NewTask, ResourceVersion, Task, TaskId, TaskStatus, TaskUpdate,
};
use async_trait::async_trait;

/// Task persistence contract.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Stores a new task and returns it with its assigned id and version.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::Persistence`] on storage failure.
    async fn create(&self, task: NewTask) -> StoreResult<Task>;

    /// Stores a new task together with one pending image row per name.
    ///
    /// The task and its rows are written as one unit: on error nothing is
    /// stored.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::Persistence`] on storage failure.
    async fn create_with_images(
        &self,
        task: NewTask,
        images: &[ImageName],
    ) -> StoreResult<(Task, Vec<Image>)>;

    /// Reads a task for a read-then-conditional-write round trip.
    ///
    /// The version is not a filter: the current row is returned whatever its
    /// version, and the caller decides what a mismatch means.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the id is absent.
    async fn get_by_id_and_version(
        &self,
        id: TaskId,
        version: ResourceVersion,
    ) -> StoreResult<Task>;

    /// Reads the current row of a task.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the id is absent.
    async fn get(&self, id: TaskId) -> StoreResult<Task>;

    /// Atomically applies `update` if the stored version equals `expected`.
    ///
    /// On success the row carries `expected.next()` and a fresh modification
    /// time, and the updated row is returned.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::StaleVersion`] when no row matched the
    /// id and expected version. The stored row, if any, is left untouched.
    async fn update(
        &self,
        id: TaskId,
        expected: ResourceVersion,
        update: TaskUpdate,
    ) -> StoreResult<Task>;

    /// Lists tasks without an assigned agent, in id order.
    async fn list_unassigned(&self, page: PageRequest) -> StoreResult<Page<Task>>;

    /// Lists tasks assigned to `agent` whose status is one of `statuses`.
    ///
    /// An empty `statuses` slice matches every status.
    async fn list_assigned_to(
        &self,
        agent: &AgentName,
        statuses: &[TaskStatus],
        page: PageRequest,
    ) -> StoreResult<Page<Task>>;

    /// Declared for future use; currently keeps the row.
    ///
    /// # Errors
    ///
    /// Returns [`super::StoreError::NotFound`] when the id is absent.
    async fn delete(&self, id: TaskId) -> StoreResult<()>;
}
