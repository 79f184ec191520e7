//! Fuzz target for `range` argument parsing.
//!
//! Arbitrary argument vectors must produce a parsed invocation or an error,
//! never a panic or a process exit from clap.

#![no_main]

use interest_core::interesting::parse_range_args;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|args: Vec<String>| {
    if let Ok(invocation) = parse_range_args(&args) {
        let spec = &invocation.spec;
        assert!(spec.loop_min() >= 1);
        assert!(spec.loop_max() >= spec.loop_min());
        assert!(!spec.token().is_empty());
    }
});
