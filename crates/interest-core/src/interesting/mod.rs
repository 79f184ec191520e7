//! Interestingness tests.
//!
//! An interestingness test is a predicate over one invocation of a target
//! program: given its command-line arguments and a scratch prefix it answers
//! "keep this input" (`true`) or "keep reducing" (`false`). Reducers call it
//! over and over against shrinking inputs.
//!
//! Built-in tests:
//! - [`HangTest`] (`hangs`): interesting iff the target outlives its timeout
//! - [`RangeTest`] (`range`): re-runs a wrapped test over an integer range,
//!   substituting the iteration number into its arguments
//! - [`ScriptTest`]: any executable given by path, interesting iff it exits 0
//!
//! Tests are resolved by name through a [`TestRegistry`] and receive their
//! collaborators (executor, event sink, registry) through a [`TestContext`].

pub mod hangs;
pub mod range;
pub mod registry;
pub mod script;

pub use hangs::HangTest;
pub use range::{parse_range_args, substitute, Candidates, RangeInvocation, RangeSpec, RangeTest};
pub use registry::{TestFactory, TestRegistry};
pub use script::ScriptTest;

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::DEFAULT_SCRIPT_TIMEOUT_SECS;
use crate::exec::{BoundedExecutor, ExecError};
use crate::logging::EventSink;

/// Errors from resolving or running a test.
///
/// Expected outcomes (timeouts, crashes, non-zero exits) are never errors;
/// they come back as `Ok(bool)`.
#[derive(Debug, Error)]
pub enum TestError {
    #[error("missing required argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid timeout {value:?}: expected a whole number of seconds, at most 4294967295")]
    InvalidTimeout { value: String },

    #[error("invalid {name} {value:?}: expected a non-negative integer")]
    InvalidNumber { name: &'static str, value: String },

    #[error("invalid range {loop_min}..={loop_max}: {reason}")]
    InvalidRange {
        loop_min: u64,
        loop_max: u64,
        reason: &'static str,
    },

    #[error("invalid arguments for {test}: {message}")]
    InvalidArgs { test: String, message: String },

    #[error("unknown interestingness test: {0}")]
    UnknownTest(String),

    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl TestError {
    /// Whether this is a configuration error (bad arguments, unknown test)
    /// rather than an execution failure.
    pub fn is_configuration_error(&self) -> bool {
        !matches!(self, TestError::Exec(_))
    }
}

/// The interestingness-test contract.
pub trait InterestingnessTest: Send {
    /// Name the test is registered under (or its script path).
    fn name(&self) -> &str;

    /// One-time setup, called with the test's arguments before a wrapping
    /// test starts iterating.
    fn init(&mut self, _args: &[String]) -> Result<(), TestError> {
        Ok(())
    }

    /// Decide whether the invocation described by `args` is interesting.
    ///
    /// `temp_prefix` is an opaque scratch prefix passed through to the
    /// executor unchanged.
    fn interesting(&mut self, args: &[String], temp_prefix: &str) -> Result<bool, TestError>;
}

/// Collaborators handed to every test at construction.
#[derive(Clone)]
pub struct TestContext {
    executor: Arc<dyn BoundedExecutor>,
    sink: Arc<dyn EventSink>,
    registry: Arc<TestRegistry>,
    script_timeout: Duration,
}

impl TestContext {
    pub fn new(
        executor: Arc<dyn BoundedExecutor>,
        sink: Arc<dyn EventSink>,
        registry: Arc<TestRegistry>,
    ) -> Self {
        Self {
            executor,
            sink,
            registry,
            script_timeout: Duration::from_secs(DEFAULT_SCRIPT_TIMEOUT_SECS),
        }
    }

    /// Set the timeout used for external script tests.
    pub fn with_script_timeout(mut self, timeout: Duration) -> Self {
        self.script_timeout = timeout;
        self
    }

    pub fn executor(&self) -> Arc<dyn BoundedExecutor> {
        Arc::clone(&self.executor)
    }

    pub fn sink(&self) -> Arc<dyn EventSink> {
        Arc::clone(&self.sink)
    }

    pub fn registry(&self) -> &TestRegistry {
        &self.registry
    }

    pub fn script_timeout(&self) -> Duration {
        self.script_timeout
    }

    /// Resolve a test by name or script path.
    pub fn resolve(&self, name: &str) -> Result<Box<dyn InterestingnessTest>, TestError> {
        self.registry.resolve(name, self)
    }
}

impl std::fmt::Debug for TestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestContext")
            .field("tests", &self.registry.names().collect::<Vec<_>>())
            .field("script_timeout", &self.script_timeout)
            .finish_non_exhaustive()
    }
}
