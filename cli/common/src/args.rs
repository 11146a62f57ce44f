//! Arguments shared by every binary.

use clap::ValueEnum;

/// Log level for the `--log-level` argument.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Per-chunk and per-group detail
    Trace,
    /// Stage composition and file opens
    Debug,
    /// Run summaries (default)
    #[default]
    Info,
    /// Cancellations
    Warn,
    /// Failures only
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing::Level::TRACE,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}
