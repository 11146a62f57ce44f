//! Built-in stages for typed-pipeline.
//!
//! Every stage owns the stage upstream of it and produces its next element
//! only when pulled (see [`tp_traits::Stage`]):
//!
//! - [`LineSplitter`] - Byte chunks to text lines, across chunk boundaries
//! - [`Grouped`] - Fixed-size ordered groups, short final group at the end
//! - [`Map`] - Synchronous one-to-one transform
//! - [`AsyncMap`] - Suspending one-to-one transform, one element in flight
//! - [`Throttle`] - Fixed delay before each element
//! - [`Filter`] - Predicate filter
//!
//! None of them reorders elements.

mod filter;
mod grouped;
mod lines;
mod map;
mod throttle;

pub use filter::Filter;
pub use grouped::Grouped;
pub use lines::{LineDecoding, LineSplitter};
pub use map::{AsyncMap, Map};
pub use throttle::Throttle;
