//! Terminal consumer trait.

use async_trait::async_trait;
use tp_error::Result;

/// Terminal consumer of a pipeline's output.
///
/// The executor hands every element to [`Sink::consume`] in order and, once
/// the last stage is exhausted, calls [`Sink::finish`] to obtain the run's
/// result. An error from `consume` aborts the run; effects of elements
/// consumed before the error are not undone.
#[async_trait]
pub trait Sink<T: Send + 'static>: Send {
    /// Result of a completed run.
    type Output: Send;

    /// Consumes one element.
    async fn consume(&mut self, item: T) -> Result<()>;

    /// Produces the final result once the input is exhausted.
    fn finish(self) -> Result<Self::Output>
    where
        Self: Sized;
}
