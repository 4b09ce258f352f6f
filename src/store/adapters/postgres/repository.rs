//! `PostgreSQL` repository implementations for the coordination store.

use super::{
    models::{
        AgentChangeset, AgentRow, ImageRow, NewImageRow, NewRegistryRow, NewTaskRow, RegistryRow,
        TaskChangeset, TaskRow,
    },
    schema::{agents, images, registries, tasks},
};
use crate::store::{
    domain::{
        Agent, AgentKind, AgentName, AgentStatus, AgentUpdate, Image, ImageId, ImageName,
        ImageStatus, NewRegistry, NewTask, PersistedAgentData, PersistedImageData,
        PersistedRegistryData, PersistedTaskData, Registry, RegistryId, ResourceVersion, Task,
        TaskId, TaskStatus, TaskUpdate,
    },
    ports::{
        AgentRepository, ImageRepository, Page, PageRequest, RegistryRepository, StoreError,
        StoreResult, TaskRepository,
    },
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use mockable::{Clock, DefaultClock};
use std::sync::Arc;

/// `PostgreSQL` connection pool shared by the store adapters.
pub type StorePgPool = Pool<ConnectionManager<PgConnection>>;

/// Builds a connection pool for `url` holding at most `max_connections`.
///
/// # Errors
///
/// Returns [`StoreError::Persistence`] when the pool cannot be created.
pub fn build_pool(url: &str, max_connections: u32) -> StoreResult<StorePgPool> {
    Pool::builder()
        .max_size(max_connections.max(1))
        .build(ConnectionManager::<PgConnection>::new(url))
        .map_err(StoreError::persistence)
}

async fn run_blocking<F, T>(pool: &StorePgPool, f: F) -> StoreResult<T>
where
    F: FnOnce(&mut PgConnection) -> StoreResult<T> + Send + 'static,
    T: Send + 'static,
{
    let shared = pool.clone();
    tokio::task::spawn_blocking(move || {
        let mut connection = shared.get().map_err(StoreError::persistence)?;
        f(&mut connection)
    })
    .await
    .map_err(StoreError::persistence)?
}

/// `PostgreSQL`-backed task repository.
#[derive(Debug)]
pub struct PostgresTaskRepository<C = DefaultClock> {
    pool: StorePgPool,
    clock: Arc<C>,
}

impl PostgresTaskRepository {
    /// Creates a repository stamped by the system clock.
    #[must_use]
    pub fn new(pool: StorePgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }
}

impl<C> PostgresTaskRepository<C> {
    /// Creates a repository stamped by `clock`.
    #[must_use]
    pub const fn with_clock(pool: StorePgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }
}

impl<C> Clone for PostgresTaskRepository<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> TaskRepository for PostgresTaskRepository<C> {
    async fn create(&self, task: NewTask) -> StoreResult<Task> {
        let row = new_task_row(&task, self.clock.utc());
        run_blocking(&self.pool, move |connection| insert_task(connection, &row)).await
    }

    async fn create_with_images(
        &self,
        task: NewTask,
        images: &[ImageName],
    ) -> StoreResult<(Task, Vec<Image>)> {
        let now = self.clock.utc();
        let row = new_task_row(&task, now);
        let names = images.to_vec();
        run_blocking(&self.pool, move |connection| {
            connection.transaction::<_, StoreError, _>(|tx| {
                let stored = insert_task(tx, &row)?;
                let pending = insert_images(tx, stored.id(), &names, now)?;
                Ok((stored, pending))
            })
        })
        .await
    }

    async fn get_by_id_and_version(
        &self,
        id: TaskId,
        _version: ResourceVersion,
    ) -> StoreResult<Task> {
        self.get(id).await
    }

    async fn get(&self, id: TaskId) -> StoreResult<Task> {
        run_blocking(&self.pool, move |connection| {
            find_task(connection, id)?
                .map(row_to_task)
                .transpose()?
                .ok_or_else(|| StoreError::not_found("task", id))
        })
        .await
    }

    async fn update(
        &self,
        id: TaskId,
        expected: ResourceVersion,
        update: TaskUpdate,
    ) -> StoreResult<Task> {
        let changeset = TaskChangeset {
            agent_name: update
                .agent_name
                .map(|agent| agent.map(|name| name.as_str().to_owned())),
            status: update.status.map(|status| status.as_str().to_owned()),
            message: update.message,
            name: update.name,
            resource_version: expected.next().value(),
            modified_at: self.clock.utc(),
        };
        run_blocking(&self.pool, move |connection| {
            let updated = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(id.value()))
                    .filter(tasks::resource_version.eq(expected.value())),
            )
            .set(&changeset)
            .returning(TaskRow::as_returning())
            .get_result(connection)
            .optional()
            .map_err(StoreError::persistence)?;

            // Zero rows matched: either the version moved or the id is gone.
            updated.map_or_else(
                || {
                    Err(StoreError::StaleVersion {
                        task_id: id,
                        expected,
                    })
                },
                row_to_task,
            )
        })
        .await
    }

    async fn list_unassigned(&self, page: PageRequest) -> StoreResult<Page<Task>> {
        run_blocking(&self.pool, move |connection| {
            let mut query = tasks::table
                .filter(tasks::agent_name.is_null())
                .order(tasks::id.asc())
                .limit(page_limit(page)?)
                .select(TaskRow::as_select())
                .into_boxed();
            if let Some(after) = page.after {
                query = query.filter(tasks::id.gt(after.value()));
            }
            let rows = query.load(connection).map_err(StoreError::persistence)?;
            rows_to_page(rows, page)
        })
        .await
    }

    async fn list_assigned_to(
        &self,
        agent: &AgentName,
        statuses: &[TaskStatus],
        page: PageRequest,
    ) -> StoreResult<Page<Task>> {
        let agent_name = agent.as_str().to_owned();
        let wanted: Vec<String> = statuses
            .iter()
            .map(|status| status.as_str().to_owned())
            .collect();
        run_blocking(&self.pool, move |connection| {
            let mut query = tasks::table
                .filter(tasks::agent_name.eq(agent_name))
                .order(tasks::id.asc())
                .limit(page_limit(page)?)
                .select(TaskRow::as_select())
                .into_boxed();
            if !wanted.is_empty() {
                query = query.filter(tasks::status.eq_any(wanted));
            }
            if let Some(after) = page.after {
                query = query.filter(tasks::id.gt(after.value()));
            }
            let rows = query.load(connection).map_err(StoreError::persistence)?;
            rows_to_page(rows, page)
        })
        .await
    }

    async fn delete(&self, id: TaskId) -> StoreResult<()> {
        self.get(id).await.map(|_| ())
    }
}

/// `PostgreSQL`-backed agent repository.
#[derive(Debug, Clone)]
pub struct PostgresAgentRepository {
    pool: StorePgPool,
}

impl PostgresAgentRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub const fn new(pool: StorePgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AgentRepository for PostgresAgentRepository {
    async fn create(&self, agent: &Agent) -> StoreResult<()> {
        let row = AgentRow {
            name: agent.name().as_str().to_owned(),
            status: agent.status().as_str().to_owned(),
            kind: agent.kind().as_str().to_owned(),
            message: agent.message().to_owned(),
            last_heartbeat: agent.last_heartbeat(),
            created_at: agent.created_at(),
        };
        run_blocking(&self.pool, move |connection| {
            diesel::insert_into(agents::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        StoreError::Duplicate {
                            entity: "agent",
                            key: row.name.clone(),
                        }
                    }
                    _ => StoreError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn get_by_name(&self, name: &AgentName) -> StoreResult<Option<Agent>> {
        let key = name.as_str().to_owned();
        run_blocking(&self.pool, move |connection| {
            agents::table
                .filter(agents::name.eq(key))
                .select(AgentRow::as_select())
                .first(connection)
                .optional()
                .map_err(StoreError::persistence)?
                .map(row_to_agent)
                .transpose()
        })
        .await
    }

    async fn list(&self) -> StoreResult<Vec<Agent>> {
        run_blocking(&self.pool, move |connection| {
            agents::table
                .order(agents::name.asc())
                .select(AgentRow::as_select())
                .load(connection)
                .map_err(StoreError::persistence)?
                .into_iter()
                .map(row_to_agent)
                .collect()
        })
        .await
    }

    async fn update_by_name(&self, name: &AgentName, update: AgentUpdate) -> StoreResult<Agent> {
        if update.is_empty() {
            return self
                .get_by_name(name)
                .await?
                .ok_or_else(|| StoreError::not_found("agent", name));
        }
        let key = name.clone();
        let changeset = AgentChangeset {
            status: update.status.map(|status| status.as_str().to_owned()),
            message: update.message,
            last_heartbeat: update.last_heartbeat,
        };
        run_blocking(&self.pool, move |connection| {
            diesel::update(agents::table.filter(agents::name.eq(key.as_str())))
                .set(&changeset)
                .returning(AgentRow::as_returning())
                .get_result(connection)
                .optional()
                .map_err(StoreError::persistence)?
                .map(row_to_agent)
                .transpose()?
                .ok_or_else(|| StoreError::not_found("agent", &key))
        })
        .await
    }
}

/// `PostgreSQL`-backed registry repository.
#[derive(Debug, Clone)]
pub struct PostgresRegistryRepository {
    pool: StorePgPool,
}

impl PostgresRegistryRepository {
    /// Creates a repository over `pool`.
    #[must_use]
    pub const fn new(pool: StorePgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RegistryRepository for PostgresRegistryRepository {
    async fn create(&self, registry: NewRegistry) -> StoreResult<Registry> {
        let row = NewRegistryRow {
            owner_id: registry.owner_id().to_owned(),
            repository: registry.repository().to_owned(),
            namespace: registry.namespace().to_owned(),
            username: registry.username().to_owned(),
            password: registry.password().to_owned(),
        };
        run_blocking(&self.pool, move |connection| {
            let stored = diesel::insert_into(registries::table)
                .values(&row)
                .returning(RegistryRow::as_returning())
                .get_result(connection)
                .map_err(StoreError::persistence)?;
            row_to_registry(stored)
        })
        .await
    }

    async fn get(&self, id: RegistryId) -> StoreResult<Registry> {
        run_blocking(&self.pool, move |connection| {
            registries::table
                .filter(registries::id.eq(id.value()))
                .select(RegistryRow::as_select())
                .first(connection)
                .optional()
                .map_err(StoreError::persistence)?
                .map(row_to_registry)
                .transpose()?
                .ok_or_else(|| StoreError::not_found("registry", id))
        })
        .await
    }
}

/// `PostgreSQL`-backed image repository.
#[derive(Debug)]
pub struct PostgresImageRepository<C = DefaultClock> {
    pool: StorePgPool,
    clock: Arc<C>,
}

impl PostgresImageRepository {
    /// Creates a repository stamped by the system clock.
    #[must_use]
    pub fn new(pool: StorePgPool) -> Self {
        Self::with_clock(pool, Arc::new(DefaultClock))
    }
}

impl<C> PostgresImageRepository<C> {
    /// Creates a repository stamped by `clock`.
    #[must_use]
    pub const fn with_clock(pool: StorePgPool, clock: Arc<C>) -> Self {
        Self { pool, clock }
    }
}

impl<C> Clone for PostgresImageRepository<C> {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            clock: Arc::clone(&self.clock),
        }
    }
}

#[async_trait]
impl<C: Clock + Send + Sync> ImageRepository for PostgresImageRepository<C> {
    async fn create_for_task(
        &self,
        task_id: TaskId,
        names: &[ImageName],
    ) -> StoreResult<Vec<Image>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        let now = self.clock.utc();
        let owned = names.to_vec();
        run_blocking(&self.pool, move |connection| {
            insert_images(connection, task_id, &owned, now)
        })
        .await
    }

    async fn list_for_task(&self, task_id: TaskId) -> StoreResult<Vec<Image>> {
        run_blocking(&self.pool, move |connection| {
            images::table
                .filter(images::task_id.eq(task_id.value()))
                .order(images::id.asc())
                .select(ImageRow::as_select())
                .load(connection)
                .map_err(StoreError::persistence)?
                .into_iter()
                .map(row_to_image)
                .collect()
        })
        .await
    }

    async fn update_status(
        &self,
        task_id: TaskId,
        name: &ImageName,
        status: ImageStatus,
        message: &str,
    ) -> StoreResult<Image> {
        let now = self.clock.utc();
        let image_name = name.clone();
        let note = message.to_owned();
        run_blocking(&self.pool, move |connection| {
            diesel::update(
                images::table
                    .filter(images::task_id.eq(task_id.value()))
                    .filter(images::name.eq(image_name.as_str())),
            )
            .set((
                images::status.eq(status.as_str()),
                images::message.eq(note),
                images::modified_at.eq(now),
            ))
            .returning(ImageRow::as_returning())
            .get_results(connection)
            .map_err(StoreError::persistence)?
            .into_iter()
            .next()
            .map(row_to_image)
            .transpose()?
            .ok_or_else(|| StoreError::not_found("image", format!("{task_id}/{image_name}")))
        })
        .await
    }
}

fn new_task_row(task: &NewTask, now: DateTime<Utc>) -> NewTaskRow {
    NewTaskRow {
        name: task.name().to_owned(),
        owner_id: task.owner_id().to_owned(),
        registry_id: task.registry_id().value(),
        agent_name: task.agent_name().map(|agent| agent.as_str().to_owned()),
        status: task.initial_status().as_str().to_owned(),
        resource_version: ResourceVersion::INITIAL.value(),
        message: String::new(),
        created_at: now,
        modified_at: now,
    }
}

fn insert_task(connection: &mut PgConnection, row: &NewTaskRow) -> StoreResult<Task> {
    let stored = diesel::insert_into(tasks::table)
        .values(row)
        .returning(TaskRow::as_returning())
        .get_result(connection)
        .map_err(StoreError::persistence)?;
    row_to_task(stored)
}

fn insert_images(
    connection: &mut PgConnection,
    task_id: TaskId,
    names: &[ImageName],
    now: DateTime<Utc>,
) -> StoreResult<Vec<Image>> {
    if names.is_empty() {
        return Ok(Vec::new());
    }
    let rows: Vec<NewImageRow> = names
        .iter()
        .map(|name| NewImageRow {
            task_id: task_id.value(),
            name: name.as_str().to_owned(),
            status: ImageStatus::Pending.as_str().to_owned(),
            message: String::new(),
            created_at: now,
            modified_at: now,
        })
        .collect();
    diesel::insert_into(images::table)
        .values(&rows)
        .returning(ImageRow::as_returning())
        .get_results(connection)
        .map_err(StoreError::persistence)?
        .into_iter()
        .map(row_to_image)
        .collect()
}

fn find_task(connection: &mut PgConnection, id: TaskId) -> StoreResult<Option<TaskRow>> {
    tasks::table
        .filter(tasks::id.eq(id.value()))
        .select(TaskRow::as_select())
        .first(connection)
        .optional()
        .map_err(StoreError::persistence)
}

fn page_limit(page: PageRequest) -> StoreResult<i64> {
    i64::try_from(page.limit).map_err(StoreError::persistence)
}

fn rows_to_page(rows: Vec<TaskRow>, page: PageRequest) -> StoreResult<Page<Task>> {
    let items = rows
        .into_iter()
        .map(row_to_task)
        .collect::<StoreResult<Vec<_>>>()?;
    Ok(Page::from_items(items, page.limit, Task::id))
}

fn row_to_task(row: TaskRow) -> StoreResult<Task> {
    let TaskRow {
        id,
        name,
        owner_id,
        registry_id,
        agent_name,
        status,
        resource_version,
        message,
        created_at,
        modified_at,
    } = row;

    let data = PersistedTaskData {
        id: TaskId::new(id).map_err(StoreError::persistence)?,
        name,
        owner_id,
        registry_id: RegistryId::new(registry_id).map_err(StoreError::persistence)?,
        agent_name: agent_name
            .map(AgentName::new)
            .transpose()
            .map_err(StoreError::persistence)?,
        status: TaskStatus::try_from(status.as_str()).map_err(StoreError::persistence)?,
        resource_version: ResourceVersion::new(resource_version),
        message,
        created_at,
        modified_at,
    };
    Ok(Task::from_persisted(data))
}

fn row_to_agent(row: AgentRow) -> StoreResult<Agent> {
    let data = PersistedAgentData {
        name: AgentName::new(row.name).map_err(StoreError::persistence)?,
        status: AgentStatus::try_from(row.status.as_str()).map_err(StoreError::persistence)?,
        kind: AgentKind::try_from(row.kind.as_str()).map_err(StoreError::persistence)?,
        message: row.message,
        last_heartbeat: row.last_heartbeat,
        created_at: row.created_at,
    };
    Ok(Agent::from_persisted(data))
}

fn row_to_registry(row: RegistryRow) -> StoreResult<Registry> {
    let data = PersistedRegistryData {
        id: RegistryId::new(row.id).map_err(StoreError::persistence)?,
        owner_id: row.owner_id,
        repository: row.repository,
        namespace: row.namespace,
        username: row.username,
        password: row.password,
    };
    Ok(Registry::from_persisted(data))
}

fn row_to_image(row: ImageRow) -> StoreResult<Image> {
    let data = PersistedImageData {
        id: ImageId::new(row.id).map_err(StoreError::persistence)?,
        task_id: TaskId::new(row.task_id).map_err(StoreError::persistence)?,
        name: ImageName::new(row.name).map_err(StoreError::persistence)?,
        status: ImageStatus::try_from(row.status.as_str()).map_err(StoreError::persistence)?,
        message: row.message,
        created_at: row.created_at,
        modified_at: row.modified_at,
    };
    Ok(Image::from_persisted(data))
}
