//! Status reporter that writes straight into the store.

use crate::pipeline::{
    domain::{ImageReport, TaskReport},
    ports::{ReportError, StatusReporter},
};
use crate::store::{
    domain::TaskId,
    services::{TaskService, TaskServiceError},
};
use async_trait::async_trait;

/// [`StatusReporter`] for deployments where the plugin can reach the store.
#[derive(Clone)]
pub struct StoreStatusReporter {
    service: TaskService,
}

impl StoreStatusReporter {
    /// Creates a reporter writing through `service`.
    #[must_use]
    pub const fn new(service: TaskService) -> Self {
        Self { service }
    }
}

fn task_id(raw: i64) -> Result<TaskId, ReportError> {
    TaskId::new(raw).map_err(|err| ReportError::Store(TaskServiceError::Domain(err)))
}

#[async_trait]
impl StatusReporter for StoreStatusReporter {
    async fn report_image(&self, report: &ImageReport) -> Result<(), ReportError> {
        self.service
            .report_image_status(
                task_id(report.task_id)?,
                &report.name,
                report.status,
                &report.message,
            )
            .await?;
        Ok(())
    }

    async fn report_task(&self, report: &TaskReport) -> Result<(), ReportError> {
        self.service
            .report_task_status(task_id(report.task_id)?, report.status, &report.message)
            .await?;
        Ok(())
    }
}
