//! Fuzz target for `hangs` argument parsing.

#![no_main]

use interest_core::interesting::hangs::parse_hang_args;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|args: Vec<String>| {
    if let Ok((_, command)) = parse_hang_args(&args) {
        assert!(!command.is_empty());
        assert_eq!(command.len(), args.len() - 1);
    }
});
