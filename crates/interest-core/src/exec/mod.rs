//! Bounded execution of target programs.
//!
//! The [`BoundedExecutor`] trait is the only place where interestingness tests
//! touch real processes. A test hands over a command line, a wall-clock
//! timeout, and the scratch prefix it was given; the executor runs the command
//! to completion or to the deadline and reports what happened.
//!
//! Executors never retry and never interpret the outcome. Deciding whether a
//! timeout, a crash, or a non-zero exit is "interesting" is the job of the
//! test that called them.

pub mod process;

pub use process::ProcessExecutor;

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Longest wall-clock timeout accepted from arguments or configuration.
///
/// Far beyond any real run, and small enough that `Instant::now() + MAX_TIMEOUT`
/// cannot overflow on any supported clock.
pub const MAX_TIMEOUT: Duration = Duration::from_secs(u32::MAX as u64);

/// Errors raised when a command cannot be executed at all.
///
/// Timeouts and non-zero exits are *not* errors; they are reported through
/// [`ExecutionResult::status`].
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("no command given")]
    EmptyCommand,

    #[error("command not found: {0}")]
    CommandNotFound(String),

    #[error("permission denied executing: {0}")]
    PermissionDenied(String),

    #[error("command failed to spawn: {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// How a bounded execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Exited with status code 0.
    Normal,
    /// Exited with a non-zero status code.
    Abnormal,
    /// Terminated by a signal not sent by the executor.
    Crashed,
    /// Still running at the deadline and killed by the executor.
    TimedOut,
}

impl std::fmt::Display for RunStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RunStatus::Normal => "normal",
            RunStatus::Abnormal => "abnormal",
            RunStatus::Crashed => "crashed",
            RunStatus::TimedOut => "timed_out",
        };
        write!(f, "{}", s)
    }
}

/// Result record of one bounded execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// How the process ended.
    pub status: RunStatus,

    /// Wall-clock time from spawn to exit or kill. Always populated.
    #[serde(rename = "elapsed_ms", with = "crate::config::duration_ms")]
    pub elapsed: Duration,

    /// Exit code, if the process exited on its own.
    pub exit_code: Option<i32>,

    /// Terminating signal, if any (Unix only).
    pub signal: Option<i32>,

    /// Process id of the child.
    pub pid: Option<u32>,
}

impl ExecutionResult {
    /// Build a result with only a status and elapsed time.
    pub fn new(status: RunStatus, elapsed: Duration) -> Self {
        Self {
            status,
            elapsed,
            exit_code: None,
            signal: None,
            pid: None,
        }
    }

    /// Set the exit code.
    pub fn with_exit_code(mut self, code: i32) -> Self {
        self.exit_code = Some(code);
        self
    }

    /// Whether the executor killed the process at the deadline.
    pub fn timed_out(&self) -> bool {
        self.status == RunStatus::TimedOut
    }

    /// Elapsed wall-clock time in fractional seconds.
    pub fn elapsed_secs(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }
}

/// Runs a command under a wall-clock timeout.
pub trait BoundedExecutor: Send + Sync {
    /// Run `command` (program followed by its arguments) for at most `timeout`.
    ///
    /// `temp_prefix` is the caller's scratch prefix; implementations may derive
    /// capture file names from it but must not otherwise interpret it.
    fn run(
        &self,
        command: &[String],
        timeout: Duration,
        temp_prefix: &str,
    ) -> Result<ExecutionResult, ExecError>;
}
