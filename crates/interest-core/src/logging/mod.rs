//! Structured logging for interest-core.
//!
//! Two separate concerns live here:
//! - Subscriber setup for the binary ([`init_logging`]), human-readable or
//!   JSONL on stderr
//! - The [`EventSink`] seam that tests report through, so library code never
//!   touches process-wide logger state
//!
//! # Usage
//!
//! ```ignore
//! use interest_core::logging::{init_logging, LogConfig, TracingSink};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//!
//! let sink = std::sync::Arc::new(TracingSink);
//! ```
//!
//! stdout is reserved for the verdict payload; all log output goes to stderr.

pub mod config;
pub mod events;
pub mod sink;

pub use config::{
    LogConfig, LogFormat, LogLevel, LOG_FORMAT_ENV_VAR, LOG_LEVEL_ENV_VAR, LOG_TIMESTAMPS_ENV_VAR,
};
pub use events::{event_names, Level, TestEvent};
pub use sink::{EventSink, MemorySink, NullSink, TracingSink};

use std::io::IsTerminal;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter: RUST_LOG directives if present, else the configured level.
fn build_filter(config: &LogConfig) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::from(config.level).into())
        .from_env_lossy()
}

/// Initialize the logging subsystem.
///
/// Must be called once at startup before any logging occurs.
pub fn init_logging(config: &LogConfig) {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .init();
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .init();
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .with_writer(std::io::stderr);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .init();
        }
    }
}
