//! Interestingness tests for test-case reducers.
//!
//! This library provides:
//! - The [`interesting::InterestingnessTest`] contract and the built-in
//!   `hangs` and `range` tests
//! - Bounded process execution with timeout and kill escalation
//! - Executor configuration loading and validation
//! - Structured logging of test events
//! - Exit codes for the `interest` CLI
//!
//! The binary entry point is in `main.rs`.

pub mod config;
pub mod exec;
pub mod exit_codes;
pub mod interesting;
pub mod logging;

// Re-export test doubles for integration tests
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
