//! Splits a stream of byte chunks into text lines.

use async_trait::async_trait;
use bytes::BytesMut;
use tp_error::{Result, StageKind, TpError};
use tp_traits::Stage;
use tracing::trace;

/// How line bytes are turned into text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineDecoding {
    /// Replace invalid UTF-8 sequences with U+FFFD
    #[default]
    Lossy,

    /// Fail the run on invalid UTF-8
    Strict,
}

/// Turns arbitrarily cut chunks into lines.
///
/// Lines are separated by `\n`; a `\r` directly before the separator is
/// dropped as well. The bytes after the last separator of a chunk are held
/// as the tail and prepended to the next chunk, so a line cut across any
/// number of chunk boundaries comes out whole. Splitting happens on bytes,
/// before decoding, so multi-byte characters cut by a boundary survive too.
///
/// When the upstream is exhausted a non-empty tail is emitted as the final
/// line. An empty tail is not, so input ending in a separator does not
/// produce a trailing empty line. Empty lines between two separators are
/// emitted.
///
/// One line is produced per pull; a chunk holding many lines is worked off
/// over as many pulls, without pulling upstream again.
pub struct LineSplitter<S> {
    upstream: S,
    buffer: BytesMut,
    /// Prefix of `buffer` already searched for a separator.
    scanned: usize,
    exhausted: bool,
    decoding: LineDecoding,
}

impl<S> LineSplitter<S> {
    /// Creates a splitter with lossy decoding.
    pub fn new(upstream: S) -> Self {
        Self::with_decoding(upstream, LineDecoding::default())
    }

    /// Creates a splitter with the given decoding.
    pub fn with_decoding(upstream: S, decoding: LineDecoding) -> Self {
        Self {
            upstream,
            buffer: BytesMut::new(),
            scanned: 0,
            exhausted: false,
            decoding,
        }
    }

    /// Bytes currently held back waiting for a separator.
    pub fn pending_bytes(&self) -> usize {
        self.buffer.len()
    }

    fn decode(&self, line: BytesMut) -> Result<String> {
        match String::from_utf8(line.to_vec()) {
            Ok(text) => Ok(text),
            Err(e) => match self.decoding {
                LineDecoding::Lossy => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
                LineDecoding::Strict => Err(TpError::stage(StageKind::Lines, e)),
            },
        }
    }

    /// Cuts the next complete line off the front of the buffer.
    fn take_line(&mut self) -> Option<BytesMut> {
        let pos = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n')?;
        let end = self.scanned + pos;

        let mut line = self.buffer.split_to(end + 1);
        line.truncate(end);
        if line.last() == Some(&b'\r') {
            line.truncate(end - 1);
        }
        self.scanned = 0;
        Some(line)
    }
}

#[async_trait]
impl<S> Stage for LineSplitter<S>
where
    S: Stage,
    S::Out: AsRef<[u8]>,
{
    type Out = String;

    async fn pull(&mut self) -> Result<Option<String>> {
        loop {
            if let Some(line) = self.take_line() {
                return self.decode(line).map(Some);
            }
            self.scanned = self.buffer.len();

            if self.exhausted {
                if self.buffer.is_empty() {
                    return Ok(None);
                }
                let tail = self.buffer.split();
                self.scanned = 0;
                trace!(bytes = tail.len(), "Flushing final line");
                return self.decode(tail).map(Some);
            }

            match self.upstream.pull().await? {
                Some(chunk) => {
                    let bytes = chunk.as_ref();
                    trace!(
                        bytes = bytes.len(),
                        carried = self.buffer.len(),
                        "Splitting chunk"
                    );
                    self.buffer.extend_from_slice(bytes);
                }
                None => self.exhausted = true,
            }
        }
    }

    fn kind(&self) -> StageKind {
        StageKind::Lines
    }
}
