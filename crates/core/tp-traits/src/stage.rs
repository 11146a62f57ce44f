//! Pull-based stage trait.

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use tp_error::{Result, StageKind};

/// A stream of fallible elements, as accepted by stream-backed sources.
pub type ElementStream<T> = Pin<Box<dyn Stream<Item = Result<T>> + Send>>;

/// One link of a pipeline.
///
/// Stages are pulled, never pushed: a stage produces its next element only
/// when its consumer asks for one, pulling from the stage it owns as
/// upstream as often as it needs to. Backpressure therefore needs no queues.
/// A stage that has not been pulled does no work and holds no more than the
/// bounded state its own contract allows (one tail, one group, one element in
/// flight).
///
/// Each stage owns its state exclusively. Dropping the stage chain discards
/// all of it, including any suspended future, which is how failure and
/// cancellation release resources.
///
/// # Contract
///
/// - `Ok(Some(item))` - the next element, in order
/// - `Ok(None)` - exhausted; pending state has been flushed
/// - `Err(e)` - the run must abort; the stage is not pulled again
#[async_trait]
pub trait Stage: Send {
    /// Element type produced by this stage.
    type Out: Send + 'static;

    /// Produces the next element, pulling upstream as needed.
    async fn pull(&mut self) -> Result<Option<Self::Out>>;

    /// Which kind of stage this is, for logging and error context.
    fn kind(&self) -> StageKind;

    /// Returns the name of this stage for logging.
    fn name(&self) -> &'static str {
        self.kind().as_str()
    }
}

#[async_trait]
impl<S: Stage + ?Sized> Stage for Box<S> {
    type Out = S::Out;

    async fn pull(&mut self) -> Result<Option<Self::Out>> {
        (**self).pull().await
    }

    fn kind(&self) -> StageKind {
        (**self).kind()
    }
}
