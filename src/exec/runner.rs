//! Bounded-time execution of external commands.

use super::ToolError;
use async_trait::async_trait;
use camino::Utf8PathBuf;
use std::fmt;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tracing::debug;

/// Default time budget for one tool invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(300);

/// A command line to run, with an optional working directory and standard
/// input.
///
/// Standard input set with [`CommandSpec::secret_stdin`] never appears in the
/// argument vector and is masked wherever the command is displayed.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    program: String,
    args: Vec<String>,
    stdin: Option<String>,
    current_dir: Option<Utf8PathBuf>,
}

impl CommandSpec {
    /// Starts a command for `program`.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            stdin: None,
            current_dir: None,
        }
    }

    /// Appends one argument.
    #[must_use]
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Feeds `input` to the command's standard input. It is never logged.
    #[must_use]
    pub fn secret_stdin(mut self, input: impl Into<String>) -> Self {
        self.stdin = Some(input.into());
        self
    }

    /// Appends several arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Runs the command inside `dir`.
    #[must_use]
    pub fn current_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.current_dir = Some(dir.into());
        self
    }

    /// Returns the program name.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Returns the arguments.
    #[must_use]
    pub fn arg_list(&self) -> &[String] {
        &self.args
    }

    /// Returns the working directory, if set.
    #[must_use]
    pub const fn working_dir(&self) -> Option<&Utf8PathBuf> {
        self.current_dir.as_ref()
    }

    /// Returns the standard input, if set.
    #[must_use]
    pub fn input(&self) -> Option<&str> {
        self.stdin.as_deref()
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", shell_escape(arg))?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandSpec")
            .field("command", &self.to_string())
            .field("stdin", &self.stdin.as_ref().map(|_| "***"))
            .field("current_dir", &self.current_dir)
            .finish()
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output, lossily decoded.
    pub stdout: String,
    /// Standard error, lossily decoded.
    pub stderr: String,
}

impl CommandOutput {
    /// Output captured from stdout only.
    #[must_use]
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Returns stdout followed by stderr.
    #[must_use]
    pub fn combined(&self) -> String {
        let mut combined = self.stdout.clone();
        combined.push_str(&self.stderr);
        combined
    }
}

/// Runs external commands.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs `command` to completion.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when the command cannot start, exits
    /// unsuccessfully or exceeds the runner's time budget.
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ToolError>;
}

/// [`CommandRunner`] backed by `tokio::process`.
///
/// A command that outlives the timeout is killed. Standard input is piped
/// only when the command carries some, and closed once written.
#[derive(Debug, Clone, Copy)]
pub struct TokioCommandRunner {
    timeout: Duration,
}

impl TokioCommandRunner {
    /// Creates a runner with the given per-command time budget.
    #[must_use]
    pub const fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for TokioCommandRunner {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND_TIMEOUT)
    }
}

#[async_trait]
impl CommandRunner for TokioCommandRunner {
    async fn run(&self, command: &CommandSpec) -> Result<CommandOutput, ToolError> {
        let mut process = tokio::process::Command::new(command.program());
        process
            .args(command.arg_list())
            .stdin(if command.input().is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(dir) = command.working_dir() {
            process.current_dir(dir);
        }

        debug!(command = %command, "running tool");
        let finished = async {
            let mut child = process.spawn()?;
            if let (Some(input), Some(mut pipe)) = (command.input(), child.stdin.take()) {
                pipe.write_all(input.as_bytes()).await?;
            }
            child.wait_with_output().await
        };
        let output = tokio::time::timeout(self.timeout, finished)
            .await
            .map_err(|_| ToolError::TimedOut {
                command: command.to_string(),
                timeout: self.timeout,
            })?
            .map_err(|err| ToolError::Spawn {
                program: command.program().to_owned(),
                reason: err.to_string(),
            })?;

        let captured = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };
        if output.status.success() {
            Ok(captured)
        } else {
            Err(ToolError::Failed {
                command: command.to_string(),
                status: output.status.code(),
                output: captured.combined(),
            })
        }
    }
}

/// Escapes a value for safe inclusion in a POSIX shell command.
///
/// Values made only of unreserved characters are left bare. Everything else
/// is single-quoted, with embedded quotes written as `'\''`.
#[must_use]
pub fn shell_escape(value: &str) -> String {
    let bare = !value.is_empty()
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || "-_./:=@%+,".contains(ch));
    if bare {
        return value.to_owned();
    }
    let mut escaped = String::with_capacity(value.len() + 2);
    escaped.push('\'');
    for ch in value.chars() {
        if ch == '\'' {
            escaped.push_str("'\\''");
        } else {
            escaped.push(ch);
        }
    }
    escaped.push('\'');
    escaped
}
