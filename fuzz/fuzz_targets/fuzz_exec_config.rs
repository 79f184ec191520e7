//! Fuzz target for executor config (TOML) parsing.
//!
//! Parsing must never panic; whatever parses must survive validation
//! without panicking either.

#![no_main]

use interest_core::config::ExecConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = toml::from_str::<ExecConfig>(text) {
        let _ = config.validate();
    }
});
