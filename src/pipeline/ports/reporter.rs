//! Status reporting port and its error type.

use crate::pipeline::domain::{ImageReport, TaskReport};
use crate::store::services::TaskServiceError;
use async_trait::async_trait;
use thiserror::Error;

/// Errors raised while delivering a status report.
#[derive(Debug, Error)]
pub enum ReportError {
    /// The request could not be sent or its response read.
    #[error("status callback request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The callback answered with a non-success status.
    #[error("status callback {url} answered {status}")]
    Status {
        /// Endpoint that was called.
        url: String,
        /// HTTP status code received.
        status: u16,
    },

    /// The report could not be written to the store.
    #[error(transparent)]
    Store(#[from] TaskServiceError),
}

/// Receives per-image and per-task outcomes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusReporter: Send + Sync {
    /// Records the outcome of one image.
    async fn report_image(&self, report: &ImageReport) -> Result<(), ReportError>;

    /// Records the outcome of a run.
    async fn report_task(&self, report: &TaskReport) -> Result<(), ReportError>;
}
