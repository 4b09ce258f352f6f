//! Pure pipeline types: target naming, output cleanup, the plugin config
//! artifact, outcomes and errors.

mod config;
mod error;
mod report;
mod sanitize;
mod summary;
mod target;

pub use config::{KubernetesOptions, PluginConfig, PluginOptions, PushOptions, RegistryCredentials};
pub use error::{PipelineError, TransportStage};
pub use report::{ImageReport, TaskReport};
pub use sanitize::{DEFAULT_WARNING_PREFIX, strip_warning_lines};
pub use summary::{ImageOutcome, SyncSummary};
pub use target::target_image;
