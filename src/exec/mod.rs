//! External tool execution with a per-command time budget.

mod error;
mod runner;

pub use error::ToolError;
#[cfg(test)]
pub use runner::MockCommandRunner;
pub use runner::{
    CommandOutput, CommandRunner, CommandSpec, DEFAULT_COMMAND_TIMEOUT, TokioCommandRunner,
    shell_escape,
};
