//! Core traits for typed-pipeline.
//!
//! - [`Stage`] - One link of a pipeline, pulled for its next element
//! - [`Sink`] - Terminal consumer producing the result of a run
//! - [`ChunkReader`] - External producer of raw chunks

pub mod reader;
pub mod sink;
pub mod stage;

pub use reader::*;
pub use sink::*;
pub use stage::*;
