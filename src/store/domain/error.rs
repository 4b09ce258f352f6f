//! Error types for store domain validation and parsing.

use thiserror::Error;

/// Errors returned while constructing store domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreDomainError {
    /// An identifier was zero or negative.
    #[error("invalid {kind} identifier {value}, expected a positive integer")]
    InvalidId {
        /// Identifier kind, for example `task`.
        kind: &'static str,
        /// Rejected raw value.
        value: i64,
    },

    /// The agent name is empty after trimming.
    #[error("agent name must not be empty")]
    EmptyAgentName,

    /// The agent name contains whitespace or a path separator.
    #[error("agent name '{0}' must not contain whitespace or '/'")]
    InvalidAgentName(String),

    /// The image name is empty after trimming.
    #[error("image name must not be empty")]
    EmptyImageName,

    /// The image name contains embedded whitespace.
    #[error("error image format: {0}")]
    InvalidImageName(String),

    /// The task name is empty after trimming.
    #[error("task name must not be empty")]
    EmptyTaskName,

    /// A registry field required for pushing is empty.
    #[error("registry {0} must not be empty")]
    EmptyRegistryField(&'static str),
}

/// Error returned while parsing a persisted status or kind value.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParseStatusError {
    /// What was being parsed, for example `task status`.
    pub kind: &'static str,
    /// Rejected raw value.
    pub value: String,
}

impl ParseStatusError {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_owned(),
        }
    }
}
