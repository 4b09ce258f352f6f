//! Target registries that tasks push into.

use super::{RegistryId, StoreDomainError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Push destination and its credentials.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registry {
    id: RegistryId,
    owner_id: String,
    repository: String,
    namespace: String,
    username: String,
    password: String,
}

/// Parameter object for reconstructing a persisted registry.
#[derive(Clone, PartialEq, Eq)]
pub struct PersistedRegistryData {
    /// Persisted identifier.
    pub id: RegistryId,
    /// Persisted owner.
    pub owner_id: String,
    /// Persisted registry host.
    pub repository: String,
    /// Persisted namespace.
    pub namespace: String,
    /// Persisted login user.
    pub username: String,
    /// Persisted login password.
    pub password: String,
}

impl Registry {
    /// Reconstructs a registry from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedRegistryData) -> Self {
        Self {
            id: data.id,
            owner_id: data.owner_id,
            repository: data.repository,
            namespace: data.namespace,
            username: data.username,
            password: data.password,
        }
    }

    /// Materialises a stored registry for the given store-assigned id.
    #[must_use]
    pub fn from_new(id: RegistryId, new: NewRegistry) -> Self {
        Self {
            id,
            owner_id: new.owner_id,
            repository: new.repository,
            namespace: new.namespace,
            username: new.username,
            password: new.password,
        }
    }

    /// Returns the registry identifier.
    #[must_use]
    pub const fn id(&self) -> RegistryId {
        self.id
    }

    /// Returns the owning user identifier.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the registry host, for example `harbor.example.com`.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the namespace images are pushed under.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the login user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("id", &self.id)
            .field("owner_id", &self.owner_id)
            .field("repository", &self.repository)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Validated input for creating a registry.
#[derive(Clone, PartialEq, Eq)]
pub struct NewRegistry {
    owner_id: String,
    repository: String,
    namespace: String,
    username: String,
    password: String,
}

impl NewRegistry {
    /// Creates a validated registry description.
    ///
    /// # Errors
    ///
    /// Returns [`StoreDomainError::EmptyRegistryField`] when the repository
    /// or namespace is blank.
    pub fn new(
        owner_id: impl Into<String>,
        repository: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Result<Self, StoreDomainError> {
        let host = repository.into().trim().to_owned();
        let path = namespace.into().trim().to_owned();
        if host.is_empty() {
            return Err(StoreDomainError::EmptyRegistryField("repository"));
        }
        if path.is_empty() {
            return Err(StoreDomainError::EmptyRegistryField("namespace"));
        }
        Ok(Self {
            owner_id: owner_id.into(),
            repository: host,
            namespace: path,
            username: String::new(),
            password: String::new(),
        })
    }

    /// Sets login credentials.
    #[must_use]
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = username.into();
        self.password = password.into();
        self
    }
}

impl NewRegistry {
    /// Returns the owning user identifier.
    #[must_use]
    pub fn owner_id(&self) -> &str {
        &self.owner_id
    }

    /// Returns the registry host.
    #[must_use]
    pub fn repository(&self) -> &str {
        &self.repository
    }

    /// Returns the namespace.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Returns the login user.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the login password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for NewRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewRegistry")
            .field("owner_id", &self.owner_id)
            .field("repository", &self.repository)
            .field("namespace", &self.namespace)
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}
