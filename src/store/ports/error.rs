//! Error contract shared by every store port.

use crate::store::domain::{ResourceVersion, TaskId};
use std::sync::Arc;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The addressed entity does not exist.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity kind, for example `task`.
        entity: &'static str,
        /// Lookup key rendered for diagnostics.
        key: String,
    },

    /// The optimistic version check lost: the row has moved past `expected`.
    ///
    /// Callers treat this as "someone else already advanced the task".
    #[error("task {task_id} was not updated: resource version {expected} is stale")]
    StaleVersion {
        /// Task whose update was rejected.
        task_id: TaskId,
        /// Version the caller read.
        expected: ResourceVersion,
    },

    /// A uniquely keyed entity already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate {
        /// Entity kind.
        entity: &'static str,
        /// Conflicting key.
        key: String,
    },

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    /// Builds a [`StoreError::NotFound`] for the given entity and key.
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }

    /// Returns `true` for a lost optimistic version check.
    #[must_use]
    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::StaleVersion { .. })
    }

    /// Returns `true` when the addressed entity is absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<diesel::result::Error> for StoreError {
    fn from(err: diesel::result::Error) -> Self {
        Self::persistence(err)
    }
}
