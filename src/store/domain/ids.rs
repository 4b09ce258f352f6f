//! Identifier and validated scalar types for the store domain.

use super::StoreDomainError;
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! store_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Creates a validated identifier.
            ///
            /// # Errors
            ///
            /// Returns [`StoreDomainError::InvalidId`] when the value is not
            /// positive.
            pub const fn new(value: i64) -> Result<Self, StoreDomainError> {
                if value <= 0 {
                    return Err(StoreDomainError::InvalidId { kind: $kind, value });
                }
                Ok(Self(value))
            }

            /// Returns the underlying numeric value.
            #[must_use]
            pub const fn value(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

store_id!(
    /// Store-assigned identifier of a task.
    TaskId,
    "task"
);
store_id!(
    /// Store-assigned identifier of a target registry.
    RegistryId,
    "registry"
);
store_id!(
    /// Store-assigned identifier of an image row.
    ImageId,
    "image"
);

/// Optimistic-concurrency token of a task.
///
/// Every accepted mutation replaces the version it was checked against with
/// [`ResourceVersion::next`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceVersion(i64);

impl ResourceVersion {
    /// Version given to freshly created rows.
    pub const INITIAL: Self = Self(1);

    /// Wraps a raw version value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// Returns the version written by a successful update against `self`.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Returns the underlying numeric value.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ResourceVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique name identifying an agent process.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentName(String);

impl AgentName {
    /// Creates a validated agent name.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::EmptyAgentName`] for blank input and
    /// [`StoreDomainError::InvalidAgentName`] when the name contains
    /// whitespace or `/`, which would break task key encoding and directory
    /// layout.
    pub fn new(value: impl Into<String>) -> Result<Self, StoreDomainError> {
        let raw = value.into();
        let normalized = raw.trim();
        if normalized.is_empty() {
            return Err(StoreDomainError::EmptyAgentName);
        }
        if normalized.chars().any(|ch| ch.is_whitespace() || ch == '/') {
            return Err(StoreDomainError::InvalidAgentName(raw));
        }
        Ok(Self(normalized.to_owned()))
    }

    /// Returns the name as `str`.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for AgentName {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for AgentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
