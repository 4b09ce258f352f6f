//! Service layer for task creation and status reporting.

use crate::store::{
    domain::{
        Image, ImageName, ImageStatus, NewRegistry, NewTask, Registry, RegistryId,
        StoreDomainError, Task, TaskId, TaskStatus, TaskUpdate,
    },
    ports::{ImageRepository, RegistryRepository, StoreError, TaskRepository},
};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

/// Number of read-update rounds a status report makes before giving up.
pub const DEFAULT_REPORT_ATTEMPTS: usize = 3;

/// Request payload for creating a task together with its image rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    name: String,
    owner_id: String,
    registry_id: RegistryId,
    images: Vec<String>,
}

impl CreateTaskRequest {
    /// Creates a request with the required task fields.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        owner_id: impl Into<String>,
        registry_id: RegistryId,
    ) -> Self {
        Self {
            name: name.into(),
            owner_id: owner_id.into(),
            registry_id,
            images: Vec::new(),
        }
    }

    /// Sets the source images to mirror.
    #[must_use]
    pub fn with_images<I, S>(mut self, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.images = images.into_iter().map(Into::into).collect();
        self
    }
}

/// A freshly created task and its pending image rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedTask {
    /// The stored task.
    pub task: Task,
    /// One pending row per requested image.
    pub images: Vec<Image>,
}

/// Service-level errors for task operations.
#[derive(Debug, Error)]
pub enum TaskServiceError {
    /// Domain validation failed.
    #[error(transparent)]
    Domain(#[from] StoreDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result type for task service operations.
pub type TaskServiceResult<T> = Result<T, TaskServiceError>;

/// Task creation and status reporting over the store ports.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn TaskRepository>,
    registries: Arc<dyn RegistryRepository>,
    images: Arc<dyn ImageRepository>,
    report_attempts: usize,
}

impl TaskService {
    /// Creates a new task service.
    #[must_use]
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        registries: Arc<dyn RegistryRepository>,
        images: Arc<dyn ImageRepository>,
    ) -> Self {
        Self {
            tasks,
            registries,
            images,
            report_attempts: DEFAULT_REPORT_ATTEMPTS,
        }
    }

    /// Overrides how many times a status report retries a lost version check.
    #[must_use]
    pub fn with_report_attempts(mut self, attempts: usize) -> Self {
        self.report_attempts = attempts.max(1);
        self
    }

    /// Stores a push destination.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn create_registry(&self, registry: NewRegistry) -> TaskServiceResult<Registry> {
        Ok(self.registries.create(registry).await?)
    }

    /// Creates an unassigned task and one pending row per image.
    ///
    /// Every image name is validated before anything is written, and the task
    /// is stored together with its rows or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for an invalid name and
    /// [`TaskServiceError::Store`] when the registry is unknown or
    /// persistence fails.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskServiceResult<CreatedTask> {
        let CreateTaskRequest {
            name,
            owner_id,
            registry_id,
            images,
        } = request;
        let names = images
            .into_iter()
            .map(ImageName::new)
            .collect::<Result<Vec<_>, _>>()?;
        let new_task = NewTask::new(name, owner_id, registry_id)?;
        self.registries.get(registry_id).await?;

        let (task, rows) = self.tasks.create_with_images(new_task, &names).await?;
        debug!(task_id = %task.id(), images = rows.len(), "created task");
        Ok(CreatedTask { task, images: rows })
    }

    /// Records the outcome of one image.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Domain`] for an invalid name and
    /// [`TaskServiceError::Store`] when the row is absent.
    pub async fn report_image_status(
        &self,
        task_id: TaskId,
        name: &str,
        status: ImageStatus,
        message: &str,
    ) -> TaskServiceResult<Image> {
        let image_name = ImageName::new(name)?;
        Ok(self
            .images
            .update_status(task_id, &image_name, status, message)
            .await?)
    }

    /// Records a task-level status under the version check.
    ///
    /// A lost version check re-reads the task and tries again, up to the
    /// configured number of attempts.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when the task is absent, the
    /// version check keeps losing, or persistence fails.
    pub async fn report_task_status(
        &self,
        task_id: TaskId,
        status: TaskStatus,
        message: &str,
    ) -> TaskServiceResult<Task> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let current = self.tasks.get(task_id).await?;
            let update = TaskUpdate::status(status, message);
            match self
                .tasks
                .update(task_id, current.resource_version(), update)
                .await
            {
                Ok(task) => return Ok(task),
                Err(err) if err.is_stale() && attempt < self.report_attempts => {
                    debug!(
                        task_id = %task_id,
                        attempt,
                        "status report lost version check, retrying"
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    /// Lists the image rows of a task.
    ///
    /// # Errors
    ///
    /// Returns [`TaskServiceError::Store`] when persistence fails.
    pub async fn images_of(&self, task_id: TaskId) -> TaskServiceResult<Vec<Image>> {
        Ok(self.images.list_for_task(task_id).await?)
    }
}
