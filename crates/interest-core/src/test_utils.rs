//! Test doubles for executors and wrapped tests.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::exec::{BoundedExecutor, ExecError, ExecutionResult, RunStatus};
use crate::interesting::{InterestingnessTest, TestContext, TestError};

/// Convert string literals into an owned argument list.
pub fn args(parts: &[&str]) -> Vec<String> {
    parts.iter().map(|s| s.to_string()).collect()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One call observed by [`FakeExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRun {
    pub command: Vec<String>,
    pub timeout: Duration,
    pub temp_prefix: String,
}

type Responder = dyn Fn(&[String], Duration) -> Result<ExecutionResult, ExecError> + Send + Sync;

/// Executor that never spawns anything and answers from a closure.
pub struct FakeExecutor {
    responder: Box<Responder>,
    calls: Mutex<Vec<RecordedRun>>,
}

impl FakeExecutor {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&[String], Duration) -> Result<ExecutionResult, ExecError> + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every run ends with `status` after 10ms.
    pub fn always(status: RunStatus) -> Self {
        Self::new(move |_, _| Ok(ExecutionResult::new(status, Duration::from_millis(10))))
    }

    /// Every run exits normally with status 0.
    pub fn always_normal() -> Self {
        Self::new(|_, _| {
            Ok(ExecutionResult::new(RunStatus::Normal, Duration::from_millis(10)).with_exit_code(0))
        })
    }

    pub fn calls(&self) -> Vec<RecordedRun> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }
}

impl BoundedExecutor for FakeExecutor {
    fn run(
        &self,
        command: &[String],
        timeout: Duration,
        temp_prefix: &str,
    ) -> Result<ExecutionResult, ExecError> {
        lock(&self.calls).push(RecordedRun {
            command: command.to_vec(),
            timeout,
            temp_prefix: temp_prefix.to_string(),
        });
        (self.responder)(command, timeout)
    }
}

#[derive(Debug, Default)]
struct CallLogInner {
    inits: Vec<Vec<String>>,
    calls: Vec<(Vec<String>, String)>,
}

/// Shared record of `init` and `interesting` calls across test instances.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inner: Arc<Mutex<CallLogInner>>,
}

impl CallLog {
    /// `(args, temp_prefix)` of every `interesting` call, in order.
    pub fn calls(&self) -> Vec<(Vec<String>, String)> {
        lock(&self.inner).calls.clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.inner).calls.len()
    }

    /// Arguments of every `init` call, in order.
    pub fn inits(&self) -> Vec<Vec<String>> {
        lock(&self.inner).inits.clone()
    }
}

type Verdict = dyn Fn(&[String]) -> bool + Send + Sync;

/// Wrapped test whose verdict is a function of its arguments.
pub struct RecordingTest {
    log: CallLog,
    verdict: Arc<Verdict>,
    fail_init: bool,
}

impl RecordingTest {
    pub fn new<F>(log: CallLog, verdict: F) -> Self
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        Self {
            log,
            verdict: Arc::new(verdict),
            fail_init: false,
        }
    }

    /// Registry factory producing instances that share `log` and `verdict`.
    pub fn factory<F>(
        log: CallLog,
        verdict: F,
    ) -> impl Fn(&TestContext) -> Box<dyn InterestingnessTest> + Send + Sync + 'static
    where
        F: Fn(&[String]) -> bool + Send + Sync + 'static,
    {
        let verdict: Arc<Verdict> = Arc::new(verdict);
        move |_ctx: &TestContext| -> Box<dyn InterestingnessTest> {
            Box::new(RecordingTest {
                log: log.clone(),
                verdict: Arc::clone(&verdict),
                fail_init: false,
            })
        }
    }

    /// Registry factory whose instances reject `init`.
    pub fn failing_init_factory(
        log: CallLog,
    ) -> impl Fn(&TestContext) -> Box<dyn InterestingnessTest> + Send + Sync + 'static {
        move |_ctx: &TestContext| -> Box<dyn InterestingnessTest> {
            Box::new(RecordingTest {
                log: log.clone(),
                verdict: Arc::new(|_: &[String]| true),
                fail_init: true,
            })
        }
    }
}

impl InterestingnessTest for RecordingTest {
    fn name(&self) -> &str {
        "recording"
    }

    fn init(&mut self, args: &[String]) -> Result<(), TestError> {
        if self.fail_init {
            return Err(TestError::InvalidArgs {
                test: self.name().to_string(),
                message: "init rejected arguments".to_string(),
            });
        }
        lock(&self.log.inner).inits.push(args.to_vec());
        Ok(())
    }

    fn interesting(&mut self, args: &[String], temp_prefix: &str) -> Result<bool, TestError> {
        lock(&self.log.inner)
            .calls
            .push((args.to_vec(), temp_prefix.to_string()));
        Ok((self.verdict)(args))
    }
}
