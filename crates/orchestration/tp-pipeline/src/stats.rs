//! Statistics for pipeline runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tp_types::PipelineState;

/// Statistics of one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionStats {
    /// Final state of the run
    pub state: PipelineState,

    /// Elements handed to the sink
    pub elements: u64,

    /// When the terminal operation started driving the stages
    pub started_at: DateTime<Utc>,

    /// Wall time from start to the end state
    pub elapsed: Duration,
}

impl ExecutionStats {
    /// Stats for a run that starts now.
    pub(crate) fn start() -> Self {
        Self {
            state: PipelineState::Running,
            elements: 0,
            started_at: Utc::now(),
            elapsed: Duration::ZERO,
        }
    }

    /// Record one element delivered to the sink.
    pub(crate) fn record_element(&mut self) {
        self.elements += 1;
    }

    /// Move to an end state.
    pub(crate) fn finish(&mut self, state: PipelineState, elapsed: Duration) {
        debug_assert!(self.state.can_transition_to(state));
        self.state = state;
        self.elapsed = elapsed;
    }

    /// Throughput in elements per second.
    pub fn elements_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.elements as f64 / secs
        } else {
            0.0
        }
    }
}

/// Result of [`Pipeline::run`](crate::Pipeline::run): the sink's output and the run's stats.
#[derive(Debug)]
pub struct RunOutcome<O> {
    pub output: O,
    pub stats: ExecutionStats,
}
