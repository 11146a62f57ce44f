//! Source stages: the first link of every pipeline.

use async_trait::async_trait;
use futures::StreamExt;
use std::sync::Arc;
use tp_error::{Result, StageKind};
use tp_traits::{ChunkReader, ChunkStream, ElementStream, Stage};
use tp_types::Chunk;
use tracing::debug;

/// Source backed by an existing element stream.
pub struct StreamSource<T> {
    stream: ElementStream<T>,
}

impl<T> StreamSource<T> {
    pub fn new(stream: ElementStream<T>) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<T: Send + 'static> Stage for StreamSource<T> {
    type Out = T;

    async fn pull(&mut self) -> Result<Option<T>> {
        self.stream.next().await.transpose()
    }

    fn kind(&self) -> StageKind {
        StageKind::Source
    }
}

/// Source backed by a [`ChunkReader`].
///
/// The underlying source is opened on the first pull, not at construction,
/// so building a pipeline performs no I/O. Once the reader's stream ends it
/// is dropped, releasing the file handle before the run finishes.
pub struct ReaderSource {
    reader: Arc<dyn ChunkReader>,
    uri: String,
    stream: Option<ChunkStream>,
    exhausted: bool,
}

impl ReaderSource {
    pub fn new(reader: Arc<dyn ChunkReader>, uri: impl Into<String>) -> Self {
        Self {
            reader,
            uri: uri.into(),
            stream: None,
            exhausted: false,
        }
    }

    /// URI this source reads from.
    pub fn uri(&self) -> &str {
        &self.uri
    }
}

#[async_trait]
impl Stage for ReaderSource {
    type Out = Chunk;

    async fn pull(&mut self) -> Result<Option<Chunk>> {
        if self.stream.is_none() {
            if self.exhausted {
                return Ok(None);
            }
            debug!(uri = %self.uri, "Opening source on first pull");
            self.stream = Some(self.reader.read_stream(&self.uri).await?);
        }

        let Some(stream) = self.stream.as_mut() else {
            return Ok(None);
        };
        match stream.next().await {
            Some(chunk) => chunk.map(Some),
            None => {
                self.stream = None;
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    fn kind(&self) -> StageKind {
        StageKind::Source
    }
}
