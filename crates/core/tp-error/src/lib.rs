//! Error types and classification for typed-pipeline.
//!
//! This crate provides:
//! - [`TpError`] - Top-level error enum for everything a pipeline run can fail with
//! - Domain-specific errors ([`SourceError`], [`ConfigError`])
//! - [`StageKind`] naming the stage an error was raised in
//! - [`ErrorKind`] classifying errors into stage, configuration, external and cancellation

use thiserror::Error;

/// Top-level error type for typed-pipeline.
#[derive(Error, Debug)]
pub enum TpError {
    /// A transform, predicate or decoder failed inside a stage
    #[error("Stage error in {stage}: {source}")]
    Stage {
        stage: StageKind,
        #[source]
        source: anyhow::Error,
    },

    /// The chunk producer failed (open, read)
    #[error("Source error: {0}")]
    Source(#[from] SourceError),

    /// The terminal consumer failed
    #[error("Sink error: {0}")]
    Sink(anyhow::Error),

    /// Invalid construction arguments
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The run was stopped from outside before it completed
    #[error("Pipeline cancelled")]
    Cancelled,
}

impl TpError {
    /// Wraps an error raised by user code running inside `stage`.
    pub fn stage(stage: StageKind, source: impl Into<anyhow::Error>) -> Self {
        Self::Stage {
            stage,
            source: source.into(),
        }
    }

    /// Wraps an error raised by a sink's consumer function.
    pub fn sink(source: impl Into<anyhow::Error>) -> Self {
        Self::Sink(source.into())
    }

    /// Classifies this error. See [`classify_error`].
    pub fn kind(&self) -> ErrorKind {
        classify_error(self)
    }

    /// Stage the error was raised in, if it came from one.
    pub fn stage_kind(&self) -> Option<StageKind> {
        match self {
            Self::Stage { stage, .. } => Some(*stage),
            Self::Source(_) => Some(StageKind::Source),
            Self::Sink(_) => Some(StageKind::Sink),
            _ => None,
        }
    }

    /// Returns true if the run was cancelled rather than failed.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Errors raised by a chunk producer.
#[derive(Error, Debug)]
pub enum SourceError {
    /// File not found
    #[error("File not found: {0}")]
    NotFound(String),

    /// Access denied
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// I/O error during open, seek or read
    #[error("I/O error: {0}")]
    Io(String),

    /// A host-provided element stream yielded an error
    #[error("Upstream stream failed: {0}")]
    Upstream(String),
}

/// Configuration errors, raised before any element flows.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `grouped` requires a positive group size
    #[error("group size must be at least 1, got {0}")]
    InvalidGroupSize(usize),

    /// Start offset lies after the end offset
    #[error("start offset {start} is greater than end offset {end}")]
    InvalidRange { start: u64, end: u64 },

    /// Chunk buffer size must be positive
    #[error("buffer size must be at least 1")]
    InvalidBufferSize,

    /// Unrecognized file open flags
    #[error("unsupported open flags '{0}' (expected r, r+ or a+)")]
    UnsupportedFlags(String),

    /// Unrecognized text encoding
    #[error("unsupported encoding '{0}' (expected utf8 or latin1)")]
    UnsupportedEncoding(String),
}

/// Stage an error originated in, for error context and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Chunk producer or element stream
    Source,

    /// Byte chunks to text lines
    Lines,

    /// Synchronous element transform
    Map,

    /// Suspending element transform
    MapAsync,

    /// Predicate filter
    Filter,

    /// Fixed-size grouping
    Grouped,

    /// Fixed delay per element
    Throttle,

    /// Terminal consumer
    Sink,
}

impl StageKind {
    /// Short lowercase name used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::Lines => "lines",
            Self::Map => "map",
            Self::MapAsync => "map_async",
            Self::Filter => "filter",
            Self::Grouped => "grouped",
            Self::Throttle => "throttle",
            Self::Sink => "sink",
        }
    }
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error classification.
///
/// None of the categories is retried; the classification exists so hosts can
/// tell their own bugs (configuration) from failing data (stage) and failing
/// collaborators (external).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Raised by a transform, predicate or decoder
    Stage,

    /// Invalid construction arguments, detected before execution
    Configuration,

    /// Surfaced by the chunk producer or the sink
    External,

    /// External stop signal
    Cancelled,
}

/// Classifies an error into the pipeline's error taxonomy.
pub fn classify_error(error: &TpError) -> ErrorKind {
    match error {
        TpError::Stage { .. } => ErrorKind::Stage,
        TpError::Source(_) | TpError::Sink(_) => ErrorKind::External,
        TpError::Config(_) => ErrorKind::Configuration,
        TpError::Cancelled => ErrorKind::Cancelled,
    }
}

/// Result type alias using TpError.
pub type Result<T> = std::result::Result<T, TpError>;
