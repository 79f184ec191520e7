//! Exit codes for the `interest` CLI.
//!
//! A reducer driving `interest` as a subprocess reads the verdict from the
//! exit code alone, so these values are a stable contract.
//!
//! Exit code ranges:
//! - 0-1: Verdict (interesting / not interesting)
//! - 10-19: User/environment errors (recoverable by user action)
//! - 20-29: Execution errors

use crate::config::ConfigError;
use crate::exec::ExecError;
use crate::interesting::TestError;

/// Exit codes for `interest` invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    // ========================================================================
    // Verdicts (0-1)
    // ========================================================================
    /// The test judged the input interesting
    Interesting = 0,

    /// The test ran and judged the input not interesting
    NotInteresting = 1,

    // ========================================================================
    // User / Environment Errors (10-19)
    // ========================================================================
    /// Invalid arguments (bad timeout, bad range bounds, missing command)
    ArgsError = 10,

    /// Test name is neither registered nor an existing script
    UnknownTest = 11,

    /// Permission denied executing the target
    PermissionError = 12,

    /// Config file missing, unreadable or invalid
    ConfigError = 13,

    // ========================================================================
    // Execution Errors (20-29)
    // ========================================================================
    /// The target could not be executed
    ExecError = 21,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Map a verdict to its exit code.
    pub fn from_verdict(interesting: bool) -> Self {
        if interesting {
            ExitCode::Interesting
        } else {
            ExitCode::NotInteresting
        }
    }

    /// Whether this code is a verdict rather than an error.
    pub fn is_verdict(self) -> bool {
        (self as i32) < 10
    }

    /// Check if this exit code is a user/environment error (codes 10-19).
    pub fn is_user_error(self) -> bool {
        let code = self as i32;
        (10..20).contains(&code)
    }

    /// Check if this exit code indicates any error requiring attention.
    pub fn is_error(self) -> bool {
        (self as i32) >= 10
    }

    /// Get the code name as a string constant (for JSON output).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::Interesting => "OK_INTERESTING",
            ExitCode::NotInteresting => "OK_NOT_INTERESTING",
            ExitCode::ArgsError => "ERR_ARGS",
            ExitCode::UnknownTest => "ERR_UNKNOWN_TEST",
            ExitCode::PermissionError => "ERR_PERMISSION",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::ExecError => "ERR_EXEC",
        }
    }
}

impl From<&TestError> for ExitCode {
    fn from(error: &TestError) -> Self {
        match error {
            TestError::UnknownTest(_) => ExitCode::UnknownTest,
            TestError::Exec(exec) => ExitCode::from(exec),
            TestError::MissingArgument(_)
            | TestError::InvalidTimeout { .. }
            | TestError::InvalidNumber { .. }
            | TestError::InvalidRange { .. }
            | TestError::InvalidArgs { .. } => ExitCode::ArgsError,
        }
    }
}

impl From<&ExecError> for ExitCode {
    fn from(error: &ExecError) -> Self {
        match error {
            ExecError::PermissionDenied(_) => ExitCode::PermissionError,
            ExecError::EmptyCommand => ExitCode::ArgsError,
            ExecError::CommandNotFound(_) | ExecError::SpawnFailed { .. } | ExecError::Io(_) => {
                ExitCode::ExecError
            }
        }
    }
}

impl From<&ConfigError> for ExitCode {
    fn from(_: &ConfigError) -> Self {
        ExitCode::ConfigError
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl std::fmt::Display for ExitCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.code_name(), self.as_i32())
    }
}
