//! Logging initialization.

use anyhow::{anyhow, Result};
use tracing::Level;
use tracing_subscriber::fmt;

use crate::LogLevel;

/// Installs the global fmt subscriber at `level`.
///
/// Logs go to stderr; stdout carries the pipeline's output. Fails if a
/// global subscriber is already installed.
pub fn init_logging(level: LogLevel) -> Result<()> {
    let level: Level = level.into();

    fmt::Subscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow!("failed to initialize logging: {}", e))
}
