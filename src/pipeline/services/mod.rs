//! Pipeline services: the concurrent sync and the plugin runner.

mod plugin;
mod sync;

pub use plugin::PluginRunner;
pub use sync::SyncPipeline;
