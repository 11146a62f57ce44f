//! CLI argument definitions for tp-lines.

use clap::Parser;
pub use tp_cli_common::LogLevel;
use tp_pipeline::LineDecoding;
use tp_types::{Encoding, OpenFlags, ReadOptions, DEFAULT_BUFFER_SIZE};

/// Run a line pipeline over a file.
///
/// Reads the file in chunks, splits it into lines, optionally filters,
/// throttles and groups them, and prints the result to stdout. Logs go to
/// stderr.
///
/// ## Examples
///
/// Print the lines containing "ERROR":
///   tp-lines app.log --contains ERROR
///
/// Count the lines in the second kilobyte of a Latin-1 file:
///   tp-lines data.txt --start 1024 --end 2047 --encoding latin1 --count
///
/// Print lines in JSON groups of 100:
///   tp-lines data.txt --group 100
#[derive(Parser, Debug)]
#[command(name = "tp-lines")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// File to read (plain path or file:// URI)
    pub path: String,

    // === Read options ===
    /// First byte to read (inclusive)
    #[arg(long, default_value_t = 0)]
    pub start: u64,

    /// Last byte to read (inclusive); defaults to end of file
    #[arg(long)]
    pub end: Option<u64>,

    /// Bytes per chunk (must be >= 1)
    #[arg(long, default_value_t = DEFAULT_BUFFER_SIZE, value_parser = parse_positive_usize)]
    pub buffer_size: usize,

    /// File open flags: r, r+ or a+
    #[arg(long, default_value = "r")]
    pub flags: OpenFlags,

    /// Text encoding: utf8 or latin1
    #[arg(long, default_value = "utf8")]
    pub encoding: Encoding,

    /// Fail on invalid UTF-8 instead of replacing it
    #[arg(long)]
    pub strict: bool,

    // === Stages ===
    /// Keep only lines containing this text
    #[arg(long)]
    pub contains: Option<String>,

    /// Wait this many milliseconds before each line
    #[arg(long)]
    pub throttle_ms: Option<u64>,

    /// Print lines in JSON arrays of this size (must be >= 1)
    #[arg(long, value_parser = parse_positive_usize)]
    pub group: Option<usize>,

    /// Print only the number of lines (or groups)
    #[arg(long)]
    pub count: bool,

    // === Logging ===
    /// Log level
    #[arg(
        short = 'l',
        long,
        value_enum,
        default_value = "info",
        env = "TP_LOG_LEVEL"
    )]
    pub log_level: LogLevel,
}

impl Cli {
    /// Read options described by the arguments.
    pub fn read_options(&self) -> ReadOptions {
        let options = ReadOptions::new()
            .with_start(self.start)
            .with_buffer_size(self.buffer_size)
            .with_flags(self.flags)
            .with_encoding(self.encoding);
        match self.end {
            Some(end) => options.with_end(end),
            None => options,
        }
    }

    /// Line decoding selected by `--strict`.
    pub fn decoding(&self) -> LineDecoding {
        if self.strict {
            LineDecoding::Strict
        } else {
            LineDecoding::Lossy
        }
    }
}

/// Parse a positive usize (>= 1).
fn parse_positive_usize(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if value < 1 {
        return Err(format!("{} is not in 1..", value));
    }
    Ok(value)
}
