//! Config delivery adapters.

mod git;
mod memory;

pub use git::{CONFIG_FILE, GitConfigDelivery, PLUGIN_DIR};
pub use memory::RecordingDelivery;
