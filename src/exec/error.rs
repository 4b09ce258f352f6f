//! Failures of external tool invocations.

use std::time::Duration;
use thiserror::Error;

/// Why an external command did not produce usable output.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ToolError {
    /// The process could not be started.
    #[error("failed to start {program}: {reason}")]
    Spawn {
        /// Program name.
        program: String,
        /// OS-level reason.
        reason: String,
    },

    /// The process exited unsuccessfully.
    #[error("{command} exited with {}: {output}", exit_description(*.status))]
    Failed {
        /// Shell-escaped command line.
        command: String,
        /// Exit code, absent when terminated by a signal.
        status: Option<i32>,
        /// Combined stdout and stderr.
        output: String,
    },

    /// The process outlived its time budget and was killed.
    #[error("{command} timed out after {timeout:?}")]
    TimedOut {
        /// Shell-escaped command line.
        command: String,
        /// Budget that was exceeded.
        timeout: Duration,
    },
}

fn exit_description(status: Option<i32>) -> String {
    status.map_or_else(|| "a signal".to_owned(), |code| format!("status {code}"))
}
