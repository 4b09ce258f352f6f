//! Server coordinator: assigns pending tasks and watches agent liveness.

mod controller;
mod error;
mod monitor;
mod scheduler;

pub use controller::ServerController;
pub use error::ServerError;
pub use monitor::Monitor;
pub use scheduler::Scheduler;
