//! Process executor with wall-clock timeout and kill escalation.
//!
//! This is the concrete [`BoundedExecutor`] used by the CLI:
//!
//! - Per-run deadline with SIGTERM → SIGKILL escalation
//! - The child runs in its own process group so helpers it forks die with it
//! - stdout/stderr captured to `<prefix>-out.txt` / `<prefix>-err.txt`
//! - Exit classification into [`RunStatus`] without further interpretation
//!
//! # Example
//!
//! ```ignore
//! use interest_core::exec::{BoundedExecutor, ProcessExecutor};
//! use std::time::Duration;
//!
//! let executor = ProcessExecutor::with_defaults();
//! let cmd = vec!["sleep".to_string(), "10".to_string()];
//! let result = executor.run(&cmd, Duration::from_secs(1), "tmp1/1")?;
//! assert!(result.timed_out());
//! ```

use std::fs::File;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, error, instrument, trace, warn};

use super::{BoundedExecutor, ExecError, ExecutionResult, RunStatus, MAX_TIMEOUT};
use crate::config::ExecConfig;

/// Suffix of the stdout capture file derived from the temp prefix.
pub const STDOUT_SUFFIX: &str = "-out.txt";

/// Suffix of the stderr capture file derived from the temp prefix.
pub const STDERR_SUFFIX: &str = "-err.txt";

/// Executor that spawns real child processes.
#[derive(Debug, Clone, Default)]
pub struct ProcessExecutor {
    config: ExecConfig,
}

impl ProcessExecutor {
    /// Create an executor with the given configuration.
    pub fn new(config: ExecConfig) -> Self {
        Self { config }
    }

    /// Create an executor with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ExecConfig::default())
    }

    /// Build the command, wiring stdio to capture files when configured.
    fn build_command(&self, command: &[String], temp_prefix: &str) -> Result<Command, ExecError> {
        let (program, args) = command.split_first().ok_or(ExecError::EmptyCommand)?;

        let mut cmd = Command::new(program);
        cmd.args(args).stdin(Stdio::null());

        if self.config.capture_output && !temp_prefix.is_empty() {
            let stdout = File::create(format!("{}{}", temp_prefix, STDOUT_SUFFIX))?;
            let stderr = File::create(format!("{}{}", temp_prefix, STDERR_SUFFIX))?;
            cmd.stdout(Stdio::from(stdout)).stderr(Stdio::from(stderr));
        } else {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        Ok(cmd)
    }

    /// Poll the child until it exits or the deadline passes.
    ///
    /// Returns the exit status and whether the deadline was hit. A timeout too
    /// large for the monotonic clock means the child is waited on without a
    /// deadline.
    fn wait_with_deadline(
        &self,
        child: &mut Child,
        timeout: Duration,
    ) -> Result<(ExitStatus, bool), ExecError> {
        let deadline = Instant::now().checked_add(timeout);
        if deadline.is_none() {
            debug!(timeout_secs = timeout.as_secs(), "timeout beyond clock range, waiting without deadline");
        }

        loop {
            match child.try_wait() {
                Ok(Some(status)) => {
                    trace!(exit_code = ?status.code(), "process exited");
                    return Ok((status, false));
                }
                Ok(None) => {}
                Err(e) => return Err(self.abandon(child, e)),
            }

            let now = Instant::now();
            let pause = match deadline {
                Some(deadline) if now >= deadline => {
                    debug!(timeout_ms = timeout.as_millis() as u64, "command timed out, sending SIGTERM");
                    self.kill_with_grace(child);
                    let status = child.wait()?;
                    return Ok((status, true));
                }
                Some(deadline) => self.config.poll_interval.min(deadline - now),
                None => self.config.poll_interval,
            };
            thread::sleep(pause);
        }
    }

    /// Kill and reap a child whose status can no longer be polled.
    fn abandon(&self, child: &mut Child, e: std::io::Error) -> ExecError {
        error!(pid = child.id(), error = %e, "failed to wait for child, killing it");
        self.kill_with_grace(child);
        if let Err(reap) = child.wait() {
            warn!(pid = child.id(), error = %reap, "failed to reap killed child");
        }
        ExecError::Io(e)
    }

    /// Kill the child's process group with SIGTERM, then SIGKILL after the grace period.
    ///
    /// The grace period covers the whole group: members that outlive the
    /// leader are still killed once it runs out.
    #[cfg(unix)]
    fn kill_with_grace(&self, child: &mut Child) {
        let pid = child.id() as i32;

        // Negative pid addresses the whole process group.
        unsafe {
            libc::kill(-pid, libc::SIGTERM);
        }
        debug!(pid, "sent SIGTERM");

        let grace_deadline = Instant::now().checked_add(self.config.kill_grace.min(MAX_TIMEOUT));
        let mut leader_exited = false;
        while grace_deadline.is_some_and(|d| Instant::now() < d) {
            if leader_exited {
                if !group_alive(pid) {
                    trace!(pid, "process group empty after SIGTERM");
                    return;
                }
            } else {
                match child.try_wait() {
                    Ok(Some(_)) => {
                        trace!(pid, "group leader exited after SIGTERM");
                        leader_exited = true;
                        continue;
                    }
                    Ok(None) => {}
                    Err(e) => {
                        error!(pid, error = %e, "failed to check process status");
                        break;
                    }
                }
            }
            thread::sleep(self.config.poll_interval);
        }

        if leader_exited {
            warn!(pid, "process group outlived SIGTERM, sending SIGKILL");
        } else {
            warn!(pid, "process did not exit after SIGTERM, sending SIGKILL");
        }
        unsafe {
            libc::kill(-pid, libc::SIGKILL);
        }
    }

    #[cfg(not(unix))]
    fn kill_with_grace(&self, child: &mut Child) {
        let _ = child.kill();
    }
}

impl BoundedExecutor for ProcessExecutor {
    #[instrument(skip(self, command), fields(cmd = %command.first().map(String::as_str).unwrap_or("")))]
    fn run(
        &self,
        command: &[String],
        timeout: Duration,
        temp_prefix: &str,
    ) -> Result<ExecutionResult, ExecError> {
        let mut cmd = self.build_command(command, temp_prefix)?;

        debug!(
            args = ?command,
            timeout_ms = timeout.as_millis() as u64,
            temp_prefix,
            "running command"
        );

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|e| spawn_error(&command[0], e))?;
        let pid = child.id();

        let (status, timed_out) = self.wait_with_deadline(&mut child, timeout)?;
        let elapsed = start.elapsed();

        let result = classify(status, timed_out, elapsed, pid);
        debug!(
            pid,
            status = %result.status,
            exit_code = ?result.exit_code,
            elapsed_ms = elapsed.as_millis() as u64,
            "command finished"
        );
        Ok(result)
    }
}

/// Map a spawn failure onto the executor's error taxonomy.
fn spawn_error(program: &str, e: std::io::Error) -> ExecError {
    error!(command = %program, error = %e, "failed to spawn");
    match e.kind() {
        std::io::ErrorKind::NotFound => ExecError::CommandNotFound(program.to_string()),
        std::io::ErrorKind::PermissionDenied => ExecError::PermissionDenied(program.to_string()),
        _ => ExecError::SpawnFailed {
            command: program.to_string(),
            source: e,
        },
    }
}

/// Whether any process, zombies included, is left in the group.
#[cfg(unix)]
fn group_alive(pgid: i32) -> bool {
    if unsafe { libc::kill(-pgid, 0) } == 0 {
        return true;
    }
    std::io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

fn classify(status: ExitStatus, timed_out: bool, elapsed: Duration, pid: u32) -> ExecutionResult {
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal: Option<i32> = None;

    let run_status = if timed_out {
        RunStatus::TimedOut
    } else if let Some(code) = status.code() {
        if code == 0 {
            RunStatus::Normal
        } else {
            RunStatus::Abnormal
        }
    } else {
        RunStatus::Crashed
    };

    ExecutionResult {
        status: run_status,
        elapsed,
        exit_code: status.code(),
        signal,
        pid: Some(pid),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn test_executor() -> ProcessExecutor {
        ProcessExecutor::new(ExecConfig::default().with_kill_grace(Duration::from_millis(100)))
    }

    fn cmd(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normal_exit() {
        let result = test_executor()
            .run(&cmd(&["true"]), Duration::from_secs(5), "")
            .unwrap();
        assert_eq!(result.status, RunStatus::Normal);
        assert_eq!(result.exit_code, Some(0));
        assert!(result.pid.is_some());
    }

    #[test]
    fn test_nonzero_exit_is_abnormal() {
        let result = test_executor()
            .run(&cmd(&["sh", "-c", "exit 42"]), Duration::from_secs(5), "")
            .unwrap();
        assert_eq!(result.status, RunStatus::Abnormal);
        assert_eq!(result.exit_code, Some(42));
    }

    #[test]
    fn test_signal_is_crash() {
        let result = test_executor()
            .run(&cmd(&["sh", "-c", "kill -SEGV $$"]), Duration::from_secs(5), "")
            .unwrap();
        assert_eq!(result.status, RunStatus::Crashed);
        assert_eq!(result.signal, Some(libc::SIGSEGV));
        assert_eq!(result.exit_code, None);
    }

    #[test]
    fn test_timeout_kills_process() {
        let result = test_executor()
            .run(&cmd(&["sleep", "10"]), Duration::from_millis(200), "")
            .unwrap();
        assert_eq!(result.status, RunStatus::TimedOut);
        assert!(result.timed_out());
        assert!(result.elapsed >= Duration::from_millis(200));
        assert!(result.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_escalates_to_sigkill() {
        let result = test_executor()
            .run(
                &cmd(&["sh", "-c", "trap '' TERM; sleep 10"]),
                Duration::from_millis(200),
                "",
            )
            .unwrap();
        assert_eq!(result.status, RunStatus::TimedOut);
        assert!(result.elapsed < Duration::from_secs(5));
    }

    #[test]
    fn test_timeout_beyond_clock_range_waits_for_exit() {
        let result = test_executor()
            .run(&cmd(&["true"]), Duration::MAX, "")
            .unwrap();
        assert_eq!(result.status, RunStatus::Normal);
    }

    #[test]
    fn test_huge_kill_grace_still_kills() {
        let executor = ProcessExecutor::new(ExecConfig::default().with_kill_grace(Duration::MAX));
        let result = executor
            .run(&cmd(&["sleep", "10"]), Duration::from_millis(100), "")
            .unwrap();
        assert_eq!(result.status, RunStatus::TimedOut);
        assert!(result.elapsed < Duration::from_secs(5));
    }

    /// True once `pid` has exited, whether or not it has been reaped yet.
    #[cfg(target_os = "linux")]
    fn process_gone(pid: i32) -> bool {
        match std::fs::read_to_string(format!("/proc/{}/stat", pid)) {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit(')')
                .next()
                .map_or(true, |rest| rest.trim_start().starts_with('Z')),
        }
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_timeout_kills_group_members_that_outlive_leader() {
        let dir = tempfile::tempdir().unwrap();
        let pid_file = dir.path().join("straggler.pid");
        let script = format!(
            "(trap '' TERM; sleep 30) & echo $! > {}; wait",
            pid_file.display()
        );

        let result = test_executor()
            .run(&cmd(&["sh", "-c", script.as_str()]), Duration::from_millis(300), "")
            .unwrap();
        assert_eq!(result.status, RunStatus::TimedOut);

        let straggler: i32 = std::fs::read_to_string(&pid_file)
            .unwrap()
            .trim()
            .parse()
            .unwrap();
        let deadline = Instant::now() + Duration::from_secs(3);
        while !process_gone(straggler) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(20));
        }
        let survived = !process_gone(straggler);
        if survived {
            unsafe {
                libc::kill(straggler, libc::SIGKILL);
            }
        }
        assert!(!survived, "group member {} survived the timeout", straggler);
    }

    #[test]
    fn test_wait_failure_kills_child() {
        let executor = test_executor();
        let mut child = executor
            .build_command(&cmd(&["sleep", "10"]), "")
            .unwrap()
            .spawn()
            .unwrap();

        let err = executor.abandon(&mut child, std::io::Error::other("wait failed"));
        assert!(matches!(err, ExecError::Io(_)));
        let status = child.try_wait().unwrap().expect("child reaped");
        assert!(!status.success());
    }

    #[test]
    fn test_empty_command() {
        let result = test_executor().run(&[], Duration::from_secs(1), "");
        assert!(matches!(result, Err(ExecError::EmptyCommand)));
    }

    #[test]
    fn test_command_not_found() {
        let result = test_executor().run(
            &cmd(&["/nonexistent/command/that/does/not/exist"]),
            Duration::from_secs(1),
            "",
        );
        match result {
            Err(ExecError::CommandNotFound(name)) => {
                assert_eq!(name, "/nonexistent/command/that/does/not/exist")
            }
            other => panic!("expected CommandNotFound, got {:?}", other),
        }
    }

    #[test]
    fn test_output_captured_to_prefix_files() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("1");
        let prefix = prefix.to_str().unwrap();

        let result = test_executor()
            .run(
                &cmd(&["sh", "-c", "echo hello; echo oops >&2"]),
                Duration::from_secs(5),
                prefix,
            )
            .unwrap();
        assert_eq!(result.status, RunStatus::Normal);

        let out = std::fs::read_to_string(format!("{}{}", prefix, STDOUT_SUFFIX)).unwrap();
        let err = std::fs::read_to_string(format!("{}{}", prefix, STDERR_SUFFIX)).unwrap();
        assert_eq!(out.trim(), "hello");
        assert_eq!(err.trim(), "oops");
    }

    #[test]
    fn test_capture_disabled_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("1");
        let prefix = prefix.to_str().unwrap();

        let executor = ProcessExecutor::new(ExecConfig::default().with_capture_output(false));
        executor
            .run(&cmd(&["echo", "hi"]), Duration::from_secs(5), prefix)
            .unwrap();

        assert!(!std::path::Path::new(&format!("{}{}", prefix, STDOUT_SUFFIX)).exists());
    }
}
