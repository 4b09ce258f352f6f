//! Per-image rows recording pipeline outcomes.

use super::{ImageId, ParseStatusError, StoreDomainError, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source image reference, validated before any network effect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImageName(String);

impl ImageName {
    /// Creates a validated image name.
    ///
    /// Surrounding whitespace is trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::EmptyImageName`] for blank input and
    /// [`StoreDomainError::InvalidImageName`] when whitespace remains inside
    /// the reference.
    pub fn new(value: impl Into<String>) -> Result<Self, StoreDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreDomainError::EmptyImageName);
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(StoreDomainError::InvalidImageName(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the reference as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ImageName {
    type Error = StoreDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ImageName> for String {
    fn from(value: ImageName) -> Self {
        value.0
    }
}

impl AsRef<str> for ImageName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for ImageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Outcome of mirroring one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageStatus {
    /// Not yet reported.
    Pending,
    /// Pulled, tagged and pushed.
    Succeeded,
    /// Any step failed.
    Failed,
}

impl ImageStatus {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ImageStatus {
    type Error = ParseStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            _ => Err(ParseStatusError::new("image status", value)),
        }
    }
}

/// Image row owned by a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    id: ImageId,
    task_id: TaskId,
    name: ImageName,
    status: ImageStatus,
    message: String,
    created_at: DateTime<Utc>,
    modified_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted image row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedImageData {
    /// Persisted identifier.
    pub id: ImageId,
    /// Owning task.
    pub task_id: TaskId,
    /// Source reference.
    pub name: ImageName,
    /// Latest outcome.
    pub status: ImageStatus,
    /// Latest outcome detail.
    pub message: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Modification timestamp.
    pub modified_at: DateTime<Utc>,
}

impl Image {
    /// Creates a pending image row.
    #[must_use]
    pub const fn pending(
        id: ImageId,
        task_id: TaskId,
        name: ImageName,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            task_id,
            name,
            status: ImageStatus::Pending,
            message: String::new(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Reconstructs an image row from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedImageData) -> Self {
        Self {
            id: data.id,
            task_id: data.task_id,
            name: data.name,
            status: data.status,
            message: data.message,
            created_at: data.created_at,
            modified_at: data.modified_at,
        }
    }

    /// Returns the row identifier.
    #[must_use]
    pub const fn id(&self) -> ImageId {
        self.id
    }

    /// Returns the owning task.
    #[must_use]
    pub const fn task_id(&self) -> TaskId {
        self.task_id
    }

    /// Returns the source reference.
    #[must_use]
    pub const fn name(&self) -> &ImageName {
        &self.name
    }

    /// Returns the latest outcome.
    #[must_use]
    pub const fn status(&self) -> ImageStatus {
        self.status
    }

    /// Returns the latest outcome detail.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns the modification timestamp.
    #[must_use]
    pub const fn modified_at(&self) -> DateTime<Utc> {
        self.modified_at
    }

    /// Records a pipeline outcome.
    pub fn record(&mut self, status: ImageStatus, message: &str, now: DateTime<Utc>) {
        self.status = status;
        message.clone_into(&mut self.message);
        self.modified_at = now;
    }
}
