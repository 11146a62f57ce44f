//! Chunk producer trait and related types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tp_error::Result;
use tp_types::Chunk;

use crate::ElementStream;

/// A stream of raw chunks from a byte source.
pub type ChunkStream = ElementStream<Chunk>;

/// Trait for producers of raw chunks.
///
/// A chunk reader turns a URI into a lazy stream of [`Chunk`]s. Chunk
/// boundaries are arbitrary; stages downstream must not assume they line
/// up with records.
///
/// # Implementations
///
/// - File reader: honors start/end offsets, chunk size, open flags and encoding
#[async_trait]
pub trait ChunkReader: Send + Sync {
    /// Opens a source and returns a stream of chunks.
    ///
    /// # Arguments
    ///
    /// * `uri` - Path or `file://` URI of the source
    async fn read_stream(&self, uri: &str) -> Result<ChunkStream>;

    /// Gets metadata about a source without reading its contents.
    async fn file_metadata(&self, uri: &str) -> Result<FileMetadata>;
}

/// Metadata about a byte source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    /// Size in bytes
    pub size_bytes: u64,

    /// Last modification time, when the source reports one
    pub modified: Option<DateTime<Utc>>,
}

impl FileMetadata {
    /// Creates new file metadata.
    pub fn new(size_bytes: u64) -> Self {
        Self {
            size_bytes,
            modified: None,
        }
    }

    /// Sets the modification time.
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }
}
