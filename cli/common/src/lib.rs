//! Shared utilities for typed-pipeline command line tools.
//!
//! Logging setup, the common `--log-level` argument and number formatting
//! for run summaries.

pub mod args;
pub mod format;
pub mod logging;

pub use args::LogLevel;
pub use format::{format_bytes, format_number, format_rate};
pub use logging::init_logging;
