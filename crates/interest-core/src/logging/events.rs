//! Structured events emitted by interestingness tests.
//!
//! Tests never call a logger directly. They emit [`TestEvent`]s into the
//! [`EventSink`](super::EventSink) they were constructed with, and the sink
//! decides whether the event becomes a tracing line, a captured record, or
//! nothing at all.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::exec::RunStatus;

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Standard event names used in logging.
pub mod event_names {
    // hangs
    pub const HANGS_EXITED: &str = "hangs.exited";
    pub const HANGS_TIMED_OUT: &str = "hangs.timed_out";

    // range
    pub const RANGE_STARTED: &str = "range.started";
    pub const RANGE_ITERATION: &str = "range.iteration";
    pub const RANGE_FINISHED: &str = "range.finished";

    // external scripts
    pub const SCRIPT_FINISHED: &str = "script.finished";
}

/// Something a test wants to report. Observational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum TestEvent {
    /// The target exited before its timeout.
    #[serde(rename = "hangs.exited")]
    Exited {
        #[serde(rename = "elapsed_ms", with = "crate::config::duration_ms")]
        elapsed: Duration,
    },

    /// The target was killed at its timeout.
    #[serde(rename = "hangs.timed_out")]
    TimedOut {
        #[serde(rename = "elapsed_ms", with = "crate::config::duration_ms")]
        elapsed: Duration,
    },

    #[serde(rename = "range.started")]
    RangeStarted {
        test: String,
        loop_min: u64,
        loop_max: u64,
        token: String,
    },

    /// A wrapped test is about to run for `number`.
    #[serde(rename = "range.iteration")]
    RangeIteration { number: u64 },

    #[serde(rename = "range.finished")]
    RangeFinished { interesting: bool, iterations: u64 },

    #[serde(rename = "script.finished")]
    ScriptFinished {
        script: String,
        status: RunStatus,
        exit_code: Option<i32>,
    },
}

impl TestEvent {
    /// Stable event name (see [`event_names`]).
    pub fn name(&self) -> &'static str {
        match self {
            TestEvent::Exited { .. } => event_names::HANGS_EXITED,
            TestEvent::TimedOut { .. } => event_names::HANGS_TIMED_OUT,
            TestEvent::RangeStarted { .. } => event_names::RANGE_STARTED,
            TestEvent::RangeIteration { .. } => event_names::RANGE_ITERATION,
            TestEvent::RangeFinished { .. } => event_names::RANGE_FINISHED,
            TestEvent::ScriptFinished { .. } => event_names::SCRIPT_FINISHED,
        }
    }

    /// Level the event is reported at.
    pub fn level(&self) -> Level {
        match self {
            TestEvent::Exited { .. } | TestEvent::RangeIteration { .. } => Level::Info,
            _ => Level::Debug,
        }
    }

    /// Human-readable line for console output.
    pub fn message(&self) -> String {
        match self {
            TestEvent::Exited { elapsed } => {
                format!("Exited in {:.3} seconds", elapsed.as_secs_f64())
            }
            TestEvent::TimedOut { elapsed } => {
                format!("Timed out after {:.3} seconds", elapsed.as_secs_f64())
            }
            TestEvent::RangeStarted {
                test,
                loop_min,
                loop_max,
                token,
            } => format!(
                "Running {} for {} in {}..={}",
                test, token, loop_min, loop_max
            ),
            TestEvent::RangeIteration { number } => format!("Range number {}:", number),
            TestEvent::RangeFinished {
                interesting,
                iterations,
            } => format!(
                "Range finished after {} iteration(s), interesting: {}",
                iterations, interesting
            ),
            TestEvent::ScriptFinished {
                script,
                status,
                exit_code,
            } => match exit_code {
                Some(code) => format!("{} finished ({}, exit code {})", script, status, code),
                None => format!("{} finished ({})", script, status),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_message_has_three_decimals() {
        let event = TestEvent::Exited {
            elapsed: Duration::from_millis(1234),
        };
        assert_eq!(event.message(), "Exited in 1.234 seconds");
        assert_eq!(event.level(), Level::Info);
    }

    #[test]
    fn test_range_iteration_message() {
        let event = TestEvent::RangeIteration { number: 7 };
        assert_eq!(event.message(), "Range number 7:");
        assert_eq!(event.name(), "range.iteration");
    }

    #[test]
    fn test_event_serialization_uses_event_name_tag() {
        let json = serde_json::to_value(TestEvent::RangeIteration { number: 3 }).unwrap();
        assert_eq!(json["event"], "range.iteration");
        assert_eq!(json["number"], 3);

        let json = serde_json::to_value(TestEvent::Exited {
            elapsed: Duration::from_millis(20),
        })
        .unwrap();
        assert_eq!(json["event"], "hangs.exited");
        assert_eq!(json["elapsed_ms"], 20);
    }

    #[test]
    fn test_names_match_serde_tags() {
        let events = vec![
            TestEvent::TimedOut {
                elapsed: Duration::ZERO,
            },
            TestEvent::RangeStarted {
                test: "hangs".to_string(),
                loop_min: 1,
                loop_max: 2,
                token: "RANGENUM".to_string(),
            },
            TestEvent::RangeFinished {
                interesting: false,
                iterations: 2,
            },
            TestEvent::ScriptFinished {
                script: "./check.sh".to_string(),
                status: RunStatus::Abnormal,
                exit_code: Some(1),
            },
        ];
        for event in events {
            let json = serde_json::to_value(&event).unwrap();
            assert_eq!(json["event"], event.name());
        }
    }
}
