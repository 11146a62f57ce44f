//! One-to-one element transforms.

use async_trait::async_trait;
use std::future::Future;
use tp_error::{Result, StageKind, TpError};
use tp_traits::Stage;

/// Applies a synchronous, fallible transform to every element.
///
/// An error from the transform is wrapped as a [`StageKind::Map`] stage
/// error and aborts the run.
pub struct Map<S, F> {
    upstream: S,
    f: F,
}

impl<S, F> Map<S, F> {
    pub fn new(upstream: S, f: F) -> Self {
        Self { upstream, f }
    }
}

#[async_trait]
impl<S, F, U, E> Stage for Map<S, F>
where
    S: Stage,
    F: FnMut(S::Out) -> std::result::Result<U, E> + Send,
    U: Send + 'static,
    E: Into<anyhow::Error>,
{
    type Out = U;

    async fn pull(&mut self) -> Result<Option<U>> {
        match self.upstream.pull().await? {
            Some(item) => (self.f)(item)
                .map(Some)
                .map_err(|e| TpError::stage(StageKind::Map, e)),
            None => Ok(None),
        }
    }

    fn kind(&self) -> StageKind {
        StageKind::Map
    }
}

/// Applies a suspending, fallible transform to every element.
///
/// Exactly one element is in flight: the upstream is not pulled again until
/// the transform of the current element has resolved, so output order
/// always equals input order no matter how long each transform takes.
/// Dropping the stage while a transform is suspended drops that future.
pub struct AsyncMap<S, F> {
    upstream: S,
    f: F,
}

impl<S, F> AsyncMap<S, F> {
    pub fn new(upstream: S, f: F) -> Self {
        Self { upstream, f }
    }
}

#[async_trait]
impl<S, F, Fut, U, E> Stage for AsyncMap<S, F>
where
    S: Stage,
    F: FnMut(S::Out) -> Fut + Send,
    Fut: Future<Output = std::result::Result<U, E>> + Send + 'static,
    U: Send + 'static,
    E: Into<anyhow::Error>,
{
    type Out = U;

    async fn pull(&mut self) -> Result<Option<U>> {
        let Some(item) = self.upstream.pull().await? else {
            return Ok(None);
        };
        (self.f)(item)
            .await
            .map(Some)
            .map_err(|e| TpError::stage(StageKind::MapAsync, e))
    }

    fn kind(&self) -> StageKind {
        StageKind::MapAsync
    }
}
