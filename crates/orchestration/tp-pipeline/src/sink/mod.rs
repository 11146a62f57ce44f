//! Built-in sinks.
//!
//! - [`ForEach`] - Side effect per element
//! - [`Reduce`] - Fold into an accumulator
//! - [`Collect`] - Gather every element in order
//! - [`ChannelSink`] - Hand elements to a [`ReadableStream`]

mod collect;
mod readable;

pub use collect::{Collect, ForEach, Reduce};
pub use readable::{ChannelSink, ReadableStream};

pub(crate) use readable::spawn_readable;
