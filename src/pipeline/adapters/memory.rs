//! In-memory pipeline collaborators for tests and dry runs.

use crate::exec::ToolError;
use crate::pipeline::{
    domain::{ImageReport, PipelineError, RegistryCredentials, TaskReport},
    ports::{ImageListSource, RegistryTransport, ReportError, StatusReporter},
};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

/// Transport that records every call and fails chosen operations.
#[derive(Debug, Clone, Default)]
pub struct RecordingTransport {
    calls: Arc<Mutex<Vec<String>>>,
    fail_login: bool,
    failing_pushes: HashSet<String>,
}

impl RecordingTransport {
    /// Creates a transport where everything succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes `login` fail.
    #[must_use]
    pub const fn failing_login(mut self) -> Self {
        self.fail_login = true;
        self
    }

    /// Makes the push of `target` fail.
    #[must_use]
    pub fn failing_push(mut self, target: impl Into<String>) -> Self {
        self.failing_pushes.insert(target.into());
        self
    }

    /// Returns the recorded calls, such as `push r/n/nginx`.
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: String) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    fn refused(command: String) -> ToolError {
        ToolError::Failed {
            command,
            status: Some(1),
            output: "denied".to_owned(),
        }
    }
}

#[async_trait]
impl RegistryTransport for RecordingTransport {
    async fn login(&self, registry: &RegistryCredentials) -> Result<(), ToolError> {
        let call = format!("login {}", registry.repository);
        self.record(call.clone());
        if self.fail_login {
            return Err(Self::refused(call));
        }
        Ok(())
    }

    async fn pull(&self, image: &str) -> Result<(), ToolError> {
        self.record(format!("pull {image}"));
        Ok(())
    }

    async fn tag(&self, source: &str, target: &str) -> Result<(), ToolError> {
        self.record(format!("tag {source} {target}"));
        Ok(())
    }

    async fn push(&self, target: &str) -> Result<(), ToolError> {
        let call = format!("push {target}");
        self.record(call.clone());
        if self.failing_pushes.contains(target) {
            return Err(Self::refused(call));
        }
        Ok(())
    }
}

/// Image source returning a fixed version and image list.
#[derive(Debug, Clone)]
pub struct StaticImageList {
    version: String,
    images: Vec<String>,
}

impl StaticImageList {
    /// Creates a source that reports `version` and lists `images`.
    #[must_use]
    pub fn new<I, S>(version: impl Into<String>, images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            version: version.into(),
            images: images.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ImageListSource for StaticImageList {
    async fn client_version(&self) -> Result<String, PipelineError> {
        Ok(self.version.clone())
    }

    async fn list_images(&self, _kubernetes_version: &str) -> Result<Vec<String>, PipelineError> {
        Ok(self.images.clone())
    }
}

/// Reporter that keeps every report in memory.
#[derive(Debug, Clone, Default)]
pub struct RecordingReporter {
    images: Arc<Mutex<Vec<ImageReport>>>,
    tasks: Arc<Mutex<Vec<TaskReport>>>,
}

impl RecordingReporter {
    /// Creates an empty reporter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the image reports received so far.
    #[must_use]
    pub fn image_reports(&self) -> Vec<ImageReport> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the task reports received so far.
    #[must_use]
    pub fn task_reports(&self) -> Vec<TaskReport> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl StatusReporter for RecordingReporter {
    async fn report_image(&self, report: &ImageReport) -> Result<(), ReportError> {
        self.images
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }

    async fn report_task(&self, report: &TaskReport) -> Result<(), ReportError> {
        self.tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(report.clone());
        Ok(())
    }
}
