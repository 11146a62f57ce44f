//! File chunk reader implementation.

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use futures::stream;
use std::io::SeekFrom;
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tp_error::{Result, SourceError, TpError};
use tp_traits::{ChunkReader, ChunkStream, FileMetadata};
use tp_types::{Chunk, Encoding, OpenFlags, ReadOptions};
use tracing::{debug, info, trace};

/// Streaming file reader producing raw chunks.
///
/// Each pull of the returned stream performs one read of at most
/// `buffer_size` bytes, so memory stays at one chunk regardless of file size.
/// Nothing is read ahead of demand.
#[derive(Debug, Clone)]
pub struct FileChunkReader {
    options: ReadOptions,
}

/// Per-stream read position.
struct ReadState {
    file: File,
    uri: String,
    offset: u64,
    remaining: Option<u64>,
    chunk_index: usize,
    buffer_size: usize,
    encoding: Encoding,
}

impl FileChunkReader {
    /// Create a reader with the given options.
    ///
    /// Fails with a configuration error if the options are invalid.
    pub fn new(options: ReadOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Returns the read options.
    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Open a local file according to the configured flags.
    async fn open_file(&self, path: &str) -> Result<File> {
        let mut open_options = OpenOptions::new();
        open_options.read(true);
        match self.options.flags {
            OpenFlags::Read => {}
            OpenFlags::ReadWrite => {
                open_options.write(true);
            }
            OpenFlags::AppendRead => {
                open_options.append(true).create(true);
            }
        }

        debug!(path = path, flags = %self.options.flags, "Opening local file");

        let mut file = open_options
            .open(path)
            .await
            .map_err(|e| map_io_error(e, path, "open"))?;

        if self.options.start > 0 {
            file.seek(SeekFrom::Start(self.options.start))
                .await
                .map_err(|e| map_io_error(e, path, "seek"))?;
        }

        Ok(file)
    }
}

/// Strip an optional `file://` scheme.
fn local_path(uri: &str) -> &str {
    uri.strip_prefix("file://").unwrap_or(uri)
}

/// Map an I/O error to a source error.
fn map_io_error(e: std::io::Error, path: &str, action: &str) -> TpError {
    match e.kind() {
        std::io::ErrorKind::NotFound => TpError::Source(SourceError::NotFound(path.to_string())),
        std::io::ErrorKind::PermissionDenied => {
            TpError::Source(SourceError::AccessDenied(path.to_string()))
        }
        _ => TpError::Source(SourceError::Io(format!(
            "Failed to {} file '{}': {}",
            action, path, e
        ))),
    }
}

/// Decode raw bytes into the UTF-8 payload carried by chunks.
fn decode(buf: Vec<u8>, encoding: Encoding) -> Bytes {
    match encoding {
        Encoding::Utf8 => Bytes::from(buf),
        Encoding::Latin1 => Bytes::from(buf.iter().map(|&b| b as char).collect::<String>()),
    }
}

/// Read the next chunk, or `None` at end of range or end of file.
async fn next_chunk(mut state: ReadState) -> Result<Option<(Chunk, ReadState)>> {
    let want = match state.remaining {
        Some(0) => return Ok(None),
        Some(remaining) => remaining.min(state.buffer_size as u64) as usize,
        None => state.buffer_size,
    };

    let mut buf = vec![0u8; want];
    let n = state
        .file
        .read(&mut buf)
        .await
        .map_err(|e| map_io_error(e, local_path(&state.uri), "read"))?;
    if n == 0 {
        debug!(uri = %state.uri, chunks = state.chunk_index, "Reached end of file");
        return Ok(None);
    }
    buf.truncate(n);

    trace!(
        uri = %state.uri,
        chunk_index = state.chunk_index,
        offset = state.offset,
        bytes = n,
        "Read chunk"
    );

    let chunk = Chunk::new(
        decode(buf, state.encoding),
        state.uri.clone(),
        state.chunk_index,
        state.offset,
    );

    state.offset += n as u64;
    state.chunk_index += 1;
    state.remaining = state.remaining.map(|r| r - n as u64);

    Ok(Some((chunk, state)))
}

#[async_trait]
impl ChunkReader for FileChunkReader {
    async fn read_stream(&self, uri: &str) -> Result<ChunkStream> {
        let path = local_path(uri);
        info!(uri = uri, "Opening file for chunked reading");

        let file = self.open_file(path).await?;

        let state = ReadState {
            file,
            uri: uri.to_string(),
            offset: self.options.start,
            remaining: self.options.max_bytes(),
            chunk_index: 0,
            buffer_size: self.options.buffer_size,
            encoding: self.options.encoding,
        };

        Ok(Box::pin(stream::try_unfold(state, next_chunk)))
    }

    async fn file_metadata(&self, uri: &str) -> Result<FileMetadata> {
        let path = local_path(uri);
        debug!(path = path, "Getting file metadata");

        let metadata = tokio::fs::metadata(path)
            .await
            .map_err(|e| map_io_error(e, path, "stat"))?;

        let mut result = FileMetadata::new(metadata.len());
        if let Ok(modified) = metadata.modified() {
            result = result.with_modified(DateTime::<Utc>::from(modified));
        }
        Ok(result)
    }
}
