//! Typed, pull-driven pipelines.
//!
//! A [`Pipeline`] starts at one source, passes every element through a chain
//! of stages, and ends in one sink:
//!
//! - Sources: [`Pipeline::from_file`], [`Pipeline::from_reader`],
//!   [`Pipeline::from_stream`], [`Pipeline::from_iter`]
//! - Stages: `lines`, `map`, `map_async`, `filter`, `grouped`, `throttle`
//!   and their fallible `try_*` variants
//! - Sinks: `foreach`, `reduce`, `to_vec`, `count`, `to_readable`, or any
//!   [`Sink`](tp_traits::Sink) through [`Pipeline::run`]
//!
//! Execution is a single loop pulling the last stage, so nothing is produced
//! before it is asked for and memory stays bounded by each stage's own state.
//! The first error from any stage, the source or the sink ends the run and is
//! returned from the terminal operation; nothing is retried.

mod executor;
mod pipeline;
pub mod sink;
mod source;
mod stats;

pub use pipeline::Pipeline;
pub use sink::ReadableStream;
pub use source::{ReaderSource, StreamSource};
pub use stats::{ExecutionStats, RunOutcome};
pub use tokio_util::sync::CancellationToken;
pub use tp_stages::LineDecoding;
