//! `hangs`: interesting if the target is still running at its timeout.
//!
//! ```text
//! interest hangs 3 ./js --fuzzing-safe testcase.js
//! ```
//!
//! The first argument is the timeout in whole seconds, the rest is the command
//! line. Exit codes and crash signals are deliberately ignored: a crash that
//! exits quickly is not a hang.

use std::sync::Arc;
use std::time::Duration;

use super::{InterestingnessTest, TestContext, TestError};
use crate::exec::{BoundedExecutor, MAX_TIMEOUT};
use crate::logging::{EventSink, TestEvent};

/// Registry name.
pub const NAME: &str = "hangs";

/// Hang-detection test.
pub struct HangTest {
    executor: Arc<dyn BoundedExecutor>,
    sink: Arc<dyn EventSink>,
}

impl HangTest {
    pub fn new(executor: Arc<dyn BoundedExecutor>, sink: Arc<dyn EventSink>) -> Self {
        Self { executor, sink }
    }

    pub fn from_context(ctx: &TestContext) -> Self {
        Self::new(ctx.executor(), ctx.sink())
    }
}

/// Split `[timeout_seconds, *command]` into a timeout and the command.
pub fn parse_hang_args(args: &[String]) -> Result<(Duration, &[String]), TestError> {
    let (raw_timeout, command) = args
        .split_first()
        .ok_or(TestError::MissingArgument("timeout"))?;

    let timeout = raw_timeout
        .trim()
        .parse()
        .ok()
        .map(Duration::from_secs)
        .filter(|timeout| *timeout <= MAX_TIMEOUT)
        .ok_or_else(|| TestError::InvalidTimeout {
            value: raw_timeout.clone(),
        })?;

    if command.is_empty() {
        return Err(TestError::MissingArgument("command"));
    }

    Ok((timeout, command))
}

impl InterestingnessTest for HangTest {
    fn name(&self) -> &str {
        NAME
    }

    fn interesting(&mut self, args: &[String], temp_prefix: &str) -> Result<bool, TestError> {
        let (timeout, command) = parse_hang_args(args)?;
        let result = self.executor.run(command, timeout, temp_prefix)?;

        if result.timed_out() {
            self.sink.emit(&TestEvent::TimedOut {
                elapsed: result.elapsed,
            });
            return Ok(true);
        }

        self.sink.emit(&TestEvent::Exited {
            elapsed: result.elapsed,
        });
        Ok(false)
    }
}

impl std::fmt::Debug for HangTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HangTest").finish_non_exhaustive()
    }
}
