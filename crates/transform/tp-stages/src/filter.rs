//! Predicate filter.

use async_trait::async_trait;
use tp_error::{Result, StageKind, TpError};
use tp_traits::Stage;

/// Passes on the elements for which the predicate holds.
///
/// A single pull keeps pulling upstream until an element passes or the
/// upstream is exhausted. Relative order of passing elements is kept.
pub struct Filter<S, F> {
    upstream: S,
    predicate: F,
}

impl<S, F> Filter<S, F> {
    pub fn new(upstream: S, predicate: F) -> Self {
        Self {
            upstream,
            predicate,
        }
    }
}

#[async_trait]
impl<S, F, E> Stage for Filter<S, F>
where
    S: Stage,
    F: FnMut(&S::Out) -> std::result::Result<bool, E> + Send,
    E: Into<anyhow::Error>,
{
    type Out = S::Out;

    async fn pull(&mut self) -> Result<Option<S::Out>> {
        while let Some(item) = self.upstream.pull().await? {
            let keep = (self.predicate)(&item).map_err(|e| TpError::stage(StageKind::Filter, e))?;
            if keep {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    fn kind(&self) -> StageKind {
        StageKind::Filter
    }
}
