//! Chunk types for raw producer output.

use bytes::Bytes;

/// A raw chunk of bytes wrapped with metadata.
///
/// Chunks are not aligned to any record boundary: a line, or a multi-byte
/// character, may start in one chunk and end in the next.
///
/// The payload is a [`Bytes`] handle, so cloning a chunk never copies data.
#[derive(Clone)]
pub struct Chunk {
    /// Chunk payload
    data: Bytes,

    /// Metadata about this chunk
    metadata: ChunkMetadata,
}

/// Metadata associated with a chunk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChunkMetadata {
    /// Source URI this chunk came from
    pub source: String,

    /// Index of this chunk within the source (0-indexed)
    pub chunk_index: usize,

    /// Byte offset of the first byte of this chunk within the source
    pub offset: u64,

    /// Number of payload bytes
    pub size_bytes: usize,
}

impl Chunk {
    /// Creates a new chunk with source tracking.
    ///
    /// # Arguments
    ///
    /// * `data` - The chunk payload
    /// * `source` - URI of the source
    /// * `chunk_index` - Index of this chunk within the source
    /// * `offset` - Byte offset of the chunk within the source
    pub fn new(
        data: impl Into<Bytes>,
        source: impl Into<String>,
        chunk_index: usize,
        offset: u64,
    ) -> Self {
        let data = data.into();
        let size_bytes = data.len();

        Self {
            data,
            metadata: ChunkMetadata {
                source: source.into(),
                chunk_index,
                offset,
                size_bytes,
            },
        }
    }

    /// Returns the payload.
    #[inline]
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Consumes self and returns the payload.
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.data
    }

    /// Returns metadata about this chunk.
    #[inline]
    pub fn metadata(&self) -> &ChunkMetadata {
        &self.metadata
    }

    /// Returns the payload length in bytes.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true if the payload is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl AsRef<[u8]> for Chunk {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}

impl std::fmt::Debug for Chunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chunk")
            .field("metadata", &self.metadata)
            .finish()
    }
}
