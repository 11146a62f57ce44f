//! Read configuration for file-backed chunk producers.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tp_error::ConfigError;

/// Default chunk size (64 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Options controlling how a file is turned into chunks.
///
/// Offsets are byte positions and both ends are inclusive, so
/// `start = 0, end = 9` reads exactly ten bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadOptions {
    /// First byte to read
    pub start: u64,

    /// Last byte to read (inclusive); `None` reads to end of file
    pub end: Option<u64>,

    /// Maximum bytes per chunk
    pub buffer_size: usize,

    /// How the file is opened
    pub flags: OpenFlags,

    /// Text encoding of the file contents
    pub encoding: Encoding,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            start: 0,
            end: None,
            buffer_size: DEFAULT_BUFFER_SIZE,
            flags: OpenFlags::default(),
            encoding: Encoding::default(),
        }
    }
}

impl ReadOptions {
    /// Create read options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the first byte to read.
    pub fn with_start(mut self, start: u64) -> Self {
        self.start = start;
        self
    }

    /// Set the last byte to read (inclusive).
    pub fn with_end(mut self, end: u64) -> Self {
        self.end = Some(end);
        self
    }

    /// Set the maximum chunk size.
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Set the open flags.
    pub fn with_flags(mut self, flags: OpenFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Set the text encoding.
    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Number of bytes the options allow reading, if bounded.
    ///
    /// Saturates at `u64::MAX`, so `end = u64::MAX` behaves as reading to the
    /// end of the file.
    pub fn max_bytes(&self) -> Option<u64> {
        self.end
            .map(|end| end.saturating_sub(self.start).saturating_add(1))
    }

    /// Validate the options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.buffer_size == 0 {
            return Err(ConfigError::InvalidBufferSize);
        }
        if let Some(end) = self.end {
            if self.start > end {
                return Err(ConfigError::InvalidRange {
                    start: self.start,
                    end,
                });
            }
        }
        Ok(())
    }
}

/// File open mode for reading.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenFlags {
    /// Open for reading; fails if the file does not exist (`r`)
    #[default]
    #[serde(rename = "r")]
    Read,

    /// Open for reading and writing; fails if the file does not exist (`r+`)
    #[serde(rename = "r+")]
    ReadWrite,

    /// Open for reading and appending; creates the file if missing (`a+`)
    #[serde(rename = "a+")]
    AppendRead,
}

impl OpenFlags {
    /// The flag string this mode is spelled as.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Read => "r",
            Self::ReadWrite => "r+",
            Self::AppendRead => "a+",
        }
    }
}

impl FromStr for OpenFlags {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Self::Read),
            "r+" => Ok(Self::ReadWrite),
            "a+" => Ok(Self::AppendRead),
            other => Err(ConfigError::UnsupportedFlags(other.to_string())),
        }
    }
}

impl std::fmt::Display for OpenFlags {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text encoding of a byte source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// UTF-8; bytes pass through unchanged
    #[default]
    #[serde(alias = "utf-8", alias = "UTF-8", alias = "UTF8")]
    Utf8,

    /// ISO-8859-1; every byte is one character, transcoded to UTF-8
    #[serde(
        alias = "binary",
        alias = "iso-8859-1",
        alias = "LATIN1",
        alias = "ISO-8859-1"
    )]
    Latin1,
}

impl FromStr for Encoding {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "utf8" | "utf-8" => Ok(Self::Utf8),
            "latin1" | "binary" | "iso-8859-1" => Ok(Self::Latin1),
            _ => Err(ConfigError::UnsupportedEncoding(s.to_string())),
        }
    }
}

impl std::fmt::Display for Encoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => f.write_str("utf8"),
            Self::Latin1 => f.write_str("latin1"),
        }
    }
}
