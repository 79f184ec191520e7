//! External interestingness scripts.
//!
//! A test name that is not registered but points at an existing file is run
//! as a script: `<path> <args...>` under the executor with the configured
//! script timeout. The script is interesting iff it exits normally with
//! status 0, the usual convention for reducer interestingness scripts.

use std::sync::Arc;
use std::time::Duration;

use super::{InterestingnessTest, TestContext, TestError};
use crate::exec::{BoundedExecutor, RunStatus};
use crate::logging::{EventSink, TestEvent};

/// Test backed by an executable on disk.
pub struct ScriptTest {
    path: String,
    executor: Arc<dyn BoundedExecutor>,
    sink: Arc<dyn EventSink>,
    timeout: Duration,
}

impl ScriptTest {
    pub fn new(
        path: impl Into<String>,
        executor: Arc<dyn BoundedExecutor>,
        sink: Arc<dyn EventSink>,
        timeout: Duration,
    ) -> Self {
        Self {
            path: path.into(),
            executor,
            sink,
            timeout,
        }
    }

    pub fn from_context(path: impl Into<String>, ctx: &TestContext) -> Self {
        Self::new(path, ctx.executor(), ctx.sink(), ctx.script_timeout())
    }
}

impl InterestingnessTest for ScriptTest {
    fn name(&self) -> &str {
        &self.path
    }

    fn interesting(&mut self, args: &[String], temp_prefix: &str) -> Result<bool, TestError> {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(self.path.clone());
        command.extend_from_slice(args);

        let result = self.executor.run(&command, self.timeout, temp_prefix)?;
        self.sink.emit(&TestEvent::ScriptFinished {
            script: self.path.clone(),
            status: result.status,
            exit_code: result.exit_code,
        });

        Ok(result.status == RunStatus::Normal)
    }
}

impl std::fmt::Debug for ScriptTest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptTest")
            .field("path", &self.path)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::ExecutionResult;
    use crate::logging::MemorySink;
    use crate::test_utils::{args, FakeExecutor};

    fn script(executor: &Arc<FakeExecutor>) -> ScriptTest {
        ScriptTest::new(
            "./check.sh",
            executor.clone(),
            Arc::new(MemorySink::new()),
            Duration::from_secs(30),
        )
    }

    #[test]
    fn test_exit_zero_is_interesting() {
        let executor = Arc::new(FakeExecutor::always_normal());
        assert!(script(&executor)
            .interesting(&args(&["testcase.js"]), "tmp1/1")
            .unwrap());

        let calls = executor.calls();
        assert_eq!(calls[0].command, args(&["./check.sh", "testcase.js"]));
        assert_eq!(calls[0].timeout, Duration::from_secs(30));
        assert_eq!(calls[0].temp_prefix, "tmp1/1");
    }

    #[test]
    fn test_other_outcomes_are_not_interesting() {
        for status in [RunStatus::Abnormal, RunStatus::Crashed, RunStatus::TimedOut] {
            let executor = Arc::new(FakeExecutor::new(move |_, _| {
                Ok(ExecutionResult::new(status, Duration::ZERO))
            }));
            assert!(!script(&executor).interesting(&[], "").unwrap());
        }
    }

    #[test]
    fn test_reports_script_finished() {
        let executor = Arc::new(FakeExecutor::new(|_, _| {
            Ok(ExecutionResult::new(RunStatus::Abnormal, Duration::ZERO).with_exit_code(1))
        }));
        let sink = Arc::new(MemorySink::new());
        let mut test = ScriptTest::new("./check.sh", executor, sink.clone(), Duration::from_secs(1));

        test.interesting(&[], "").unwrap();

        assert_eq!(
            sink.events(),
            vec![TestEvent::ScriptFinished {
                script: "./check.sh".to_string(),
                status: RunStatus::Abnormal,
                exit_code: Some(1),
            }]
        );
    }
}
