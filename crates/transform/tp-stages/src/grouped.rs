//! Fixed-size grouping of consecutive elements.

use async_trait::async_trait;
use std::mem;
use tp_error::{ConfigError, Result, StageKind};
use tp_traits::Stage;
use tracing::trace;

/// Upper bound on capacity reserved up front for a group.
const MAX_PREALLOCATED: usize = 1024;

/// Collects consecutive elements into groups of `size`.
///
/// Every group but the last holds exactly `size` elements; the last holds
/// whatever remained, and is only emitted if non-empty. Elements keep their
/// order within and across groups. At most one partial group is held.
pub struct Grouped<S: Stage> {
    upstream: S,
    size: usize,
    buffer: Vec<S::Out>,
    exhausted: bool,
    groups_emitted: usize,
}

impl<S: Stage> Grouped<S> {
    /// Creates a grouping stage.
    ///
    /// Fails with [`ConfigError::InvalidGroupSize`] if `size` is zero.
    pub fn new(upstream: S, size: usize) -> Result<Self> {
        if size == 0 {
            return Err(ConfigError::InvalidGroupSize(size).into());
        }
        Ok(Self {
            upstream,
            size,
            buffer: Vec::with_capacity(size.min(MAX_PREALLOCATED)),
            exhausted: false,
            groups_emitted: 0,
        })
    }

    /// Returns the configured group size.
    pub fn size(&self) -> usize {
        self.size
    }

    fn flush(&mut self) -> Vec<S::Out> {
        let group = mem::replace(
            &mut self.buffer,
            Vec::with_capacity(self.size.min(MAX_PREALLOCATED)),
        );
        trace!(
            group_index = self.groups_emitted,
            elements = group.len(),
            "Flushing group"
        );
        self.groups_emitted += 1;
        group
    }
}

#[async_trait]
impl<S: Stage> Stage for Grouped<S> {
    type Out = Vec<S::Out>;

    async fn pull(&mut self) -> Result<Option<Vec<S::Out>>> {
        if self.exhausted {
            return Ok(None);
        }

        while let Some(item) = self.upstream.pull().await? {
            self.buffer.push(item);
            if self.buffer.len() >= self.size {
                return Ok(Some(self.flush()));
            }
        }

        self.exhausted = true;
        if self.buffer.is_empty() {
            Ok(None)
        } else {
            Ok(Some(self.flush()))
        }
    }

    fn kind(&self) -> StageKind {
        StageKind::Grouped
    }
}
