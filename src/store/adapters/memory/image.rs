//! In-memory image repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockable::{Clock, DefaultClock};
use std::sync::{Arc, RwLock};

use super::lock_error;
use crate::store::{
    domain::{Image, ImageId, ImageName, ImageStatus, TaskId},
    ports::{ImageRepository, StoreError, StoreResult},
};

/// Thread-safe in-memory image repository.
#[derive(Debug)]
pub struct InMemoryImageRepository<C = DefaultClock> {
    images: Arc<RwLock<Vec<Image>>>,
    clock: Arc<C>,
}

impl InMemoryImageRepository {
    /// Creates an empty repository stamped by the system clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(Arc::new(DefaultClock))
    }
}

impl Default for InMemoryImageRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> Clone for InMemoryImageRepository<C> {
    fn clone(&self) -> Self {
        Self {
            images: Arc::clone(&self.images),
            clock: Arc::clone(&self.clock),
        }
    }
}

impl<C: Clock + Send + Sync> InMemoryImageRepository<C> {
    /// Creates an empty repository stamped by `clock`.
    #[must_use]
    pub fn with_clock(clock: Arc<C>) -> Self {
        Self {
            images: Arc::new(RwLock::new(Vec::new())),
            clock,
        }
    }
}

impl<C> InMemoryImageRepository<C> {
    pub(super) const fn rows(&self) -> &Arc<RwLock<Vec<Image>>> {
        &self.images
    }
}

/// Appends one pending row per name. Nothing is appended on error.
pub(super) fn insert_pending(
    images: &mut Vec<Image>,
    task_id: TaskId,
    names: &[ImageName],
    now: DateTime<Utc>,
) -> StoreResult<Vec<Image>> {
    let mut created = Vec::with_capacity(names.len());
    for (offset, name) in names.iter().enumerate() {
        let raw_id = i64::try_from(images.len() + offset + 1).map_err(StoreError::persistence)?;
        let id = ImageId::new(raw_id).map_err(StoreError::persistence)?;
        created.push(Image::pending(id, task_id, name.clone(), now));
    }
    images.extend(created.iter().cloned());
    Ok(created)
}

#[async_trait]
impl<C: Clock + Send + Sync> ImageRepository for InMemoryImageRepository<C> {
    async fn create_for_task(
        &self,
        task_id: TaskId,
        names: &[ImageName],
    ) -> StoreResult<Vec<Image>> {
        let now = self.clock.utc();
        let mut images = self.images.write().map_err(lock_error)?;
        insert_pending(&mut images, task_id, names, now)
    }

    async fn list_for_task(&self, task_id: TaskId) -> StoreResult<Vec<Image>> {
        let images = self.images.read().map_err(lock_error)?;
        Ok(images
            .iter()
            .filter(|image| image.task_id() == task_id)
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        task_id: TaskId,
        name: &ImageName,
        status: ImageStatus,
        message: &str,
    ) -> StoreResult<Image> {
        let now = self.clock.utc();
        let mut images = self.images.write().map_err(lock_error)?;
        let image = images
            .iter_mut()
            .find(|image| image.task_id() == task_id && image.name() == name)
            .ok_or_else(|| StoreError::not_found("image", format!("{task_id}/{name}")))?;
        image.record(status, message, now);
        Ok(image.clone())
    }
}
