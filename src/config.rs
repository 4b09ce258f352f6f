//! Process configuration loaded from YAML.
//!
//! Every field has a default, so an empty file is a valid configuration.
//! Durations are humantime strings such as `5s` or `5m`.

use crate::pipeline::domain::DEFAULT_WARNING_PREFIX;
use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// The file could not be read.
    #[error("failed to read settings {path}: {source}")]
    Read {
        /// File that was being read.
        path: Utf8PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid YAML for [`Settings`].
    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A value is out of range.
    #[error("invalid setting {field}: {reason}")]
    Invalid {
        /// Dotted field path, for example `agent.workers`.
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}

/// Complete process configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Server coordinator loops.
    pub server: ServerSettings,
    /// Agent coordinator.
    pub agent: AgentSettings,
    /// Plugin-side pipeline.
    pub pipeline: PipelineSettings,
    /// `PostgreSQL` connection.
    pub database: DatabaseSettings,
    /// Log output.
    pub log: LogSettings,
}

/// Scheduler and monitor settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Period of the scheduling loop.
    #[serde(with = "humantime_serde")]
    pub schedule_interval: Duration,
    /// Period of the liveness monitor.
    #[serde(with = "humantime_serde")]
    pub monitor_interval: Duration,
    /// Heartbeat age after which an agent is demoted.
    #[serde(with = "humantime_serde")]
    pub liveness_window: Duration,
    /// Page size for task listings.
    pub page_size: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            schedule_interval: Duration::from_secs(5),
            monitor_interval: Duration::from_secs(60),
            liveness_window: Duration::from_secs(5 * 60),
            page_size: 100,
        }
    }
}

/// Agent identity, worker pool and loop periods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSettings {
    /// Unique agent name. Required to run an agent.
    pub name: String,
    /// Directory holding the plugin template and per-task checkouts.
    pub data_dir: Utf8PathBuf,
    /// Number of concurrent reconciliation workers.
    pub workers: usize,
    /// Period of the heartbeat loop.
    #[serde(with = "humantime_serde")]
    pub heartbeat_interval: Duration,
    /// Period of the discovery loop.
    #[serde(with = "humantime_serde")]
    pub discovery_interval: Duration,
    /// Rate-limited retries of a failing key before it is dropped.
    pub max_retries: u32,
    /// Callback base URL written into plugin configs.
    pub callback: String,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            data_dir: Utf8PathBuf::from("/data"),
            workers: 5,
            heartbeat_interval: Duration::from_secs(60),
            discovery_interval: Duration::from_secs(5),
            max_retries: 5,
            callback: String::new(),
        }
    }
}

/// Tool and callback settings of the plugin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    /// Budget for one tool invocation.
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,
    /// Prefix of tool warning lines stripped before parsing.
    pub warning_prefix: String,
    /// Request timeout of status callbacks.
    #[serde(with = "humantime_serde")]
    pub callback_timeout: Duration,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            command_timeout: Duration::from_secs(5 * 60),
            warning_prefix: DEFAULT_WARNING_PREFIX.to_owned(),
            callback_timeout: Duration::from_secs(5),
        }
    }
}

/// Store connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Pool size.
    pub max_connections: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/mirrorfleet".to_owned(),
            max_connections: 10,
        }
    }
}

/// Log output settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Line format.
    pub format: LogFormat,
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl Settings {
    /// Parses settings from YAML. An empty document yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Parse`] for malformed YAML.
    pub fn from_yaml(yaml: &str) -> Result<Self, SettingsError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads settings from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Read`] when the file cannot be read and
    /// [`SettingsError::Parse`] when it is not valid.
    pub fn load(path: &Utf8Path) -> Result<Self, SettingsError> {
        let read_error = |source| SettingsError::Read {
            path: path.to_owned(),
            source,
        };
        let parent = path
            .parent()
            .filter(|dir| !dir.as_str().is_empty())
            .unwrap_or_else(|| Utf8Path::new("."));
        let file_name = path.file_name().ok_or_else(|| {
            read_error(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "not a file path",
            ))
        })?;
        let dir = Dir::open_ambient_dir(parent, ambient_authority()).map_err(read_error)?;
        let yaml = dir.read_to_string(file_name).map_err(read_error)?;
        Self::from_yaml(&yaml)
    }

    /// Rejects values the coordinators cannot run with.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Invalid`] for a zero worker count, page size
    /// or pool size, or a zero interval.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let zero_durations = [
            ("server.schedule_interval", self.server.schedule_interval),
            ("server.monitor_interval", self.server.monitor_interval),
            ("server.liveness_window", self.server.liveness_window),
            ("agent.heartbeat_interval", self.agent.heartbeat_interval),
            ("agent.discovery_interval", self.agent.discovery_interval),
            ("pipeline.command_timeout", self.pipeline.command_timeout),
            ("pipeline.callback_timeout", self.pipeline.callback_timeout),
        ];
        if let Some((field, _)) = zero_durations
            .iter()
            .find(|(_, duration)| duration.is_zero())
        {
            return Err(SettingsError::Invalid {
                field,
                reason: "must be greater than zero",
            });
        }
        if self.agent.workers == 0 {
            return Err(SettingsError::Invalid {
                field: "agent.workers",
                reason: "must be at least one",
            });
        }
        if self.server.page_size == 0 {
            return Err(SettingsError::Invalid {
                field: "server.page_size",
                reason: "must be at least one",
            });
        }
        if self.database.max_connections == 0 {
            return Err(SettingsError::Invalid {
                field: "database.max_connections",
                reason: "must be at least one",
            });
        }
        Ok(())
    }
}
