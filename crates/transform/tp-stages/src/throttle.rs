//! Fixed per-element delay.

use async_trait::async_trait;
use std::time::Duration;
use tp_error::{Result, StageKind};
use tp_traits::Stage;

/// Delays every element by a fixed duration before passing it on.
///
/// Behaves as an identity [`AsyncMap`](crate::AsyncMap) whose transform only
/// sleeps: the element is pulled, then held for `delay`, then emitted, so
/// consecutive elements are at least `delay` apart. A zero delay still
/// yields to the runtime once per element.
pub struct Throttle<S> {
    upstream: S,
    delay: Duration,
}

impl<S> Throttle<S> {
    pub fn new(upstream: S, delay: Duration) -> Self {
        Self { upstream, delay }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

#[async_trait]
impl<S: Stage> Stage for Throttle<S> {
    type Out = S::Out;

    async fn pull(&mut self) -> Result<Option<S::Out>> {
        let Some(item) = self.upstream.pull().await? else {
            return Ok(None);
        };
        tokio::time::sleep(self.delay).await;
        Ok(Some(item))
    }

    fn kind(&self) -> StageKind {
        StageKind::Throttle
    }
}
