//! File chunk producer for typed-pipeline.
//!
//! This crate provides [`FileChunkReader`], a [`ChunkReader`](tp_traits::ChunkReader)
//! that streams a local file as fixed-size chunks, honoring the byte range,
//! open flags and encoding of its [`ReadOptions`](tp_types::ReadOptions).
//!
//! # Example
//!
//! ```ignore
//! use tp_reader_file::FileChunkReader;
//! use tp_traits::ChunkReader;
//! use tp_types::ReadOptions;
//!
//! let reader = FileChunkReader::new(ReadOptions::new().with_buffer_size(4096))?;
//! let mut stream = reader.read_stream("data/input.txt").await?;
//!
//! while let Some(chunk) = stream.next().await {
//!     let chunk = chunk?;
//!     println!("chunk {} at offset {}", chunk.metadata().chunk_index, chunk.metadata().offset);
//! }
//! ```

mod reader;

pub use reader::FileChunkReader;
