//! Lifecycle state of a pipeline run.

use serde::{Deserialize, Serialize};

/// State of one pipeline execution.
///
/// ```text
/// Idle ──▶ Running ──▶ Completed
///                  ├─▶ Failed
///                  └─▶ Cancelled
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    /// Stages are being appended; nothing has been read
    #[default]
    Idle,

    /// A terminal operation is driving the stages
    Running,

    /// The source was exhausted and the sink produced its result
    Completed,

    /// A stage, the source or the sink raised an error
    Failed,

    /// An external stop signal ended the run
    Cancelled,
}

impl PipelineState {
    /// Returns true for the three end states.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}
