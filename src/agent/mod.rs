//! Agent coordinator.
//!
//! An agent registers itself, heartbeats, discovers the tasks the scheduler
//! assigned to it and reconciles each one by rendering its plugin config,
//! delivering it and moving the task to `running`.

mod controller;
mod error;
mod key;
mod reconciler;

pub use controller::{AgentController, AgentOptions};
pub use error::AgentError;
pub use key::{TaskKey, TaskKeyError};
pub use reconciler::{CONFIG_DELIVERED_MESSAGE, SyncOutcome, TaskReconciler, render_config};
