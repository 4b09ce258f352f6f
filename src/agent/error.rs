//! Errors raised by the agent coordinator.

use crate::delivery::ports::DeliveryError;
use crate::pipeline::domain::PipelineError;
use crate::store::ports::StoreError;
use thiserror::Error;

/// Errors raised while registering, discovering or reconciling.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The agent cannot start with its configuration.
    #[error("invalid agent configuration: {0}")]
    Config(String),

    /// A store call failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The rendered config could not be delivered.
    #[error(transparent)]
    Delivery(#[from] DeliveryError),

    /// The plugin config could not be rendered.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}
