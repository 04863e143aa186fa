//! Logging setup using `tracing` + `tracing-subscriber`.
//!
//! The level comes from `--log-level` / `DISPATCH_LOG_LEVEL` (default `info`).
//! Logs go to stderr.

use crate::config::LogLevel;

use tracing_subscriber::fmt;

/// Installs the global subscriber. Call once at startup.
pub fn init_logging(level: LogLevel) {
    fmt()
        .with_max_level(to_tracing_level(level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}

fn to_tracing_level(level: LogLevel) -> tracing::Level {
    match level {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}
