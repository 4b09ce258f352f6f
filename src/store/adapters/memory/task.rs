//! In-memory task repository with compare-and-set updates.

use async_trait::async_trait;
use mockable::{Clock, DefaultClock};
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use super::image::{InMemoryImageRepository, insert_pending};
use super::lock_error;
use crate::store::{
    domain::{
        AgentName, Image, ImageName, NewTask, ResourceVersion, Task, TaskId, TaskStatus,
        TaskUpdate,
    },
    ports::{Page, PageRequest, StoreError, StoreResult, TaskRepository},
};

/// Thread-safe in-memory task repository.
///
/// The version check and the write happen under one write lock, which is
/// what makes [`TaskRepository::update`] atomic here. Image rows created
/// alongside a task land in the paired [`InMemoryImageRepository`] while the
/// task lock is held.
#[derive(Debug)]
pub struct InMemoryTaskRepository<C = DefaultClock> {
    state: Arc<RwLock<InMemoryTaskState>>,
    images: InMemoryImageRepository<C>,
    clock: Arc<C>,
}

#[derive(Debug, Default)]
struct InMemoryTaskState {
    tasks: BTreeMap<TaskId, Task>,
    last_id: i64,
}

impl InMemoryTaskRepository {
    /// Creates an empty repository stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryTaskRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InMemoryTaskRepository<C> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            images: self.images.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock + Send + Sync> InMemoryTaskRepository<C> {
    /// Creates an empty repository stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            state: Arc::new(RwLock::new(InMemoryTaskState::default())),
            images: InMemoryImageRepository::with_clock(Arc::clone(&clock)),
            clock,
        }
    }

    /// Returns the image repository sharing rows with this task store.
    #[must_use]
    pub fn images(&self) -> InMemoryImageRepository<C> {
        self.images.clone()
    }

    fn page_where(
        &self,
        page: PageRequest,
        predicate: impl Fn(&Task) -> bool,
    ) -> StoreResult<Page<Task>> {
        let state = self.state.read().map_err(lock_error)?;
        let items: Vec<Task> = state
            .tasks
            .values()
            .filter(|task| page.after.is_none_or(|cursor| task.id() > cursor))
            .filter(|task| predicate(task))
            .take(page.limit)
            .cloned()
            .collect();
        Ok(Page::from_items(items, page.limit, Task::id))
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> TaskRepository for InMemoryTaskRepository<C> {
    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let mut state = self.state.write().map_err(lock_error)?;
        let next = state.last_id + 1;
        let id = TaskId::new(next).map_err(StoreError::persistence)?;
        let created = task.into_task(id, self.clock.utc());
        state.last_id = next;
        state.tasks.insert(id, created.clone());
        Ok(created)
    }

    async fn create_with_images(
        &self,
        task: NewTask,
        images: &[ImageName],
    ) -> StoreResult<(Task, Vec<Image>)> {
        let now = self.clock.utc();
        let mut state = self.state.write().map_err(lock_error)?;
        let mut rows = self.images.rows().write().map_err(lock_error)?;
        let next = state.last_id + 1;
        let id = TaskId::new(next).map_err(StoreError::persistence)?;
        let created = task.into_task(id, now);
        let pending = insert_pending(&mut rows, id, images, now)?;
        state.last_id = next;
        state.tasks.insert(id, created.clone());
        Ok((created, pending))
    }

    async fn get_by_id_and_version(
        &self,
        id: TaskId,
        _version: ResourceVersion,
    ) -> StoreResult<Task> {
        self.get(id).await
    }

    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        let state = self.state.read().map_err(lock_error)?;
        state
            .tasks
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("task", id))
    }

    async fn update(
        &self,
        id: TaskId,
        expected: ResourceVersion,
        update: TaskUpdate,
    ) -> StoreResult<Task> {
        let now = self.clock.utc();
        let mut state = self.state.write().map_err(lock_error)?;
        let Some(task) = state
            .tasks
            .get_mut(&id)
            .filter(|task| task.resource_version() == expected)
        else {
            return Err(StoreError::StaleVersion {
                task_id: id,
                expected,
            });
        };
        task.apply(&update, now);
        Ok(task.clone())
    }

    async fn list_unassigned(&self, page: PageRequest) -> StoreResult<Page<Task>> {
        self.page_where(page, Task::is_unassigned)
    }

    async fn list_assigned_to(
        &self,
        agent: &AgentName,
        statuses: &[TaskStatus],
        page: PageRequest,
    ) -> StoreResult<Page<Task>> {
        self.page_where(page, |task| {
            task.agent_name() == Some(agent)
                && (statuses.is_empty() || statuses.contains(&task.status()))
        })
    }

    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.get(id).await.map(|_| ())
    }
}
