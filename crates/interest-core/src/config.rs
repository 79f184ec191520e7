//! Executor configuration loading and validation.
//!
//! Resolution order (first match wins):
//! 1. Explicit path passed on the command line (`--config`)
//! 2. `INTEREST_CONFIG` environment variable
//! 3. Built-in defaults
//!
//! Individual CLI flags (e.g. `--kill-grace-ms`) are applied on top of the
//! resolved file by the binary.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use crate::exec::MAX_TIMEOUT;

/// Environment variable naming a TOML config file.
pub const CONFIG_ENV_VAR: &str = "INTEREST_CONFIG";

/// Grace period between SIGTERM and SIGKILL in milliseconds.
pub const DEFAULT_KILL_GRACE_MS: u64 = 500;

/// Interval between child status polls in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 10;

/// Timeout for external interestingness scripts in seconds.
pub const DEFAULT_SCRIPT_TIMEOUT_SECS: u64 = 120;

/// Errors that can occur during config loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("I/O error reading {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid TOML in config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Settings for [`ProcessExecutor`](crate::exec::ProcessExecutor) and script tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExecConfig {
    /// Time a timed-out child gets to exit after SIGTERM.
    #[serde(rename = "kill_grace_ms", with = "duration_ms")]
    pub kill_grace: Duration,

    /// How often the child's status is polled.
    #[serde(rename = "poll_interval_ms", with = "duration_ms")]
    pub poll_interval: Duration,

    /// Write child stdout/stderr to `<prefix>-out.txt` / `<prefix>-err.txt`.
    pub capture_output: bool,

    /// Timeout applied to external interestingness scripts.
    #[serde(rename = "script_timeout_secs", with = "duration_secs")]
    pub script_timeout: Duration,
}

impl Default for ExecConfig {
    fn default() -> Self {
        Self {
            kill_grace: Duration::from_millis(DEFAULT_KILL_GRACE_MS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            capture_output: true,
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECS),
        }
    }
}

impl ExecConfig {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: ExecConfig = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate()?;
        debug!(path = %path.display(), ?config, "loaded config");
        Ok(config)
    }

    /// Resolve configuration from an explicit path, the environment, or defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Self::load(Path::new(&path));
            }
        }
        debug!("no config file given, using defaults");
        Ok(Self::default())
    }

    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.script_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "script_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.script_timeout > MAX_TIMEOUT {
            return Err(ConfigError::Invalid(format!(
                "script_timeout_secs must be at most {}",
                MAX_TIMEOUT.as_secs()
            )));
        }
        if self.kill_grace > MAX_TIMEOUT {
            return Err(ConfigError::Invalid(format!(
                "kill_grace_ms must be at most {}",
                MAX_TIMEOUT.as_millis()
            )));
        }
        Ok(())
    }

    /// Set the SIGTERM → SIGKILL grace period.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace = grace;
        self
    }

    /// Enable or disable output capture files.
    pub fn with_capture_output(mut self, enabled: bool) -> Self {
        self.capture_output = enabled;
        self
    }

    /// Set the timeout for external scripts.
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }
}

pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let ms = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(ms))
    }
}

pub(crate) mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_config_defaults() {
        let config = ExecConfig::default();
        assert_eq!(config.kill_grace, Duration::from_millis(500));
        assert_eq!(config.poll_interval, Duration::from_millis(10));
        assert!(config.capture_output);
        assert_eq!(config.script_timeout, Duration::from_secs(120));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let file = write_config("kill_grace_ms = 50\ncapture_output = false\n");
        let config = ExecConfig::load(file.path()).unwrap();
        assert_eq!(config.kill_grace, Duration::from_millis(50));
        assert!(!config.capture_output);
        assert_eq!(config.poll_interval, Duration::from_millis(10));
    }

    #[test]
    fn test_load_missing_file() {
        let err = ExecConfig::load(Path::new("/nonexistent/interest.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_load_rejects_unknown_keys() {
        let file = write_config("kill_grace = 50\n");
        let err = ExecConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_validate_rejects_zero_poll_interval() {
        let file = write_config("poll_interval_ms = 0\n");
        let err = ExecConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_validate_rejects_zero_script_timeout() {
        let config = ExecConfig::default().with_script_timeout(Duration::ZERO);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_timeouts_beyond_clock_range() {
        let file = write_config("script_timeout_secs = 9223372036854775807\n");
        let err = ExecConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("script_timeout_secs")));

        let file = write_config("kill_grace_ms = 9223372036854775807\n");
        let err = ExecConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(ref msg) if msg.contains("kill_grace_ms")));

        let longest = ExecConfig::default().with_script_timeout(MAX_TIMEOUT);
        assert!(longest.validate().is_ok());
    }

    #[test]
    fn test_resolve_explicit_path_wins() {
        let file = write_config("script_timeout_secs = 7\n");
        let config = ExecConfig::resolve(Some(file.path())).unwrap();
        assert_eq!(config.script_timeout, Duration::from_secs(7));
    }

    #[test]
    fn test_toml_roundtrip_uses_unit_suffixed_keys() {
        let text = toml::to_string(&ExecConfig::default()).unwrap();
        assert!(text.contains("kill_grace_ms = 500"));
        assert!(text.contains("script_timeout_secs = 120"));
    }
}
