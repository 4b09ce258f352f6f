//! Error taxonomy of the image sync pipeline.

use crate::exec::ToolError;
use std::fmt;
use thiserror::Error;

/// Step of the registry transport that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStage {
    /// `login` against the target registry.
    Login,
    /// `pull` of the source image.
    Pull,
    /// `tag` of the source as the target.
    Tag,
    /// `push` of the target.
    Push,
}

impl fmt::Display for TransportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Login => "login",
            Self::Pull => "pull",
            Self::Tag => "tag",
            Self::Push => "push",
        })
    }
}

/// Errors returned by the sync pipeline and its collaborators.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PipelineError {
    /// The configuration cannot be acted upon. Raised before any network
    /// effect.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An auxiliary tool failed.
    #[error(transparent)]
    Tool(#[from] ToolError),

    /// A registry operation failed for one image.
    #[error("failed to {stage} {image}: {source}")]
    Transport {
        /// Image the operation was for, or the registry host for `login`.
        image: String,
        /// Failing step.
        stage: TransportStage,
        /// Underlying tool failure.
        #[source]
        source: ToolError,
    },

    /// A tool produced output that could not be parsed.
    #[error("malformed {what} output: {reason}")]
    Malformed {
        /// Which output was being parsed.
        what: &'static str,
        /// Parser message.
        reason: String,
    },

    /// A per-image worker ended without an outcome.
    #[error("image worker aborted: {0}")]
    Aborted(String),
}

impl PipelineError {
    /// Builds a [`PipelineError::Config`].
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config(reason.into())
    }

    /// Returns `true` for errors raised before any network effect.
    #[must_use]
    pub const fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}
