//! Pull-scheduler loop driving a stage chain into a sink.

use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tp_error::{Result, TpError};
use tp_traits::{Sink, Stage};
use tp_types::PipelineState;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::stats::{ExecutionStats, RunOutcome};

/// Per-run settings carried from the builder to the executor.
#[derive(Debug, Clone)]
pub(crate) struct RunContext {
    pub name: String,
    pub cancel: CancellationToken,
}

/// Runs a pipeline to its end state.
///
/// The last stage is pulled and each element consumed before the next pull,
/// so at most one element is between the chain and the sink. The first
/// error ends the loop. The chain is dropped before the sink is finished,
/// releasing files and abandoning any suspended transform.
pub(crate) async fn execute<S, K>(
    mut stage: S,
    mut sink: K,
    ctx: RunContext,
) -> Result<RunOutcome<K::Output>>
where
    S: Stage,
    K: Sink<S::Out>,
{
    let span = info_span!("pipeline", name = %ctx.name);

    async move {
        let started = Instant::now();
        let mut stats = ExecutionStats::start();
        debug!(last_stage = stage.name(), "Pipeline running");

        let pumped = pump(&mut stage, &mut sink, &ctx.cancel, &mut stats).await;
        drop(stage);

        match pumped.and_then(|()| sink.finish()) {
            Ok(output) => {
                stats.finish(PipelineState::Completed, started.elapsed());
                info!(
                    elements = stats.elements,
                    duration_ms = stats.elapsed.as_millis() as u64,
                    "Pipeline completed"
                );
                Ok(RunOutcome { output, stats })
            }
            Err(TpError::Cancelled) => {
                stats.finish(PipelineState::Cancelled, started.elapsed());
                warn!(elements = stats.elements, "Pipeline cancelled");
                Err(TpError::Cancelled)
            }
            Err(e) => {
                stats.finish(PipelineState::Failed, started.elapsed());
                error!(
                    stage = e.stage_kind().map(|k| k.as_str()).unwrap_or("pipeline"),
                    error = %e,
                    elements = stats.elements,
                    "Pipeline failed"
                );
                Err(e)
            }
        }
    }
    .instrument(span)
    .await
}

/// Moves elements from the chain into the sink until exhaustion, error or
/// cancellation.
async fn pump<S, K>(
    stage: &mut S,
    sink: &mut K,
    cancel: &CancellationToken,
    stats: &mut ExecutionStats,
) -> Result<()>
where
    S: Stage,
    K: Sink<S::Out>,
{
    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TpError::Cancelled),
            next = stage.pull() => next?,
        };
        let Some(item) = next else {
            return Ok(());
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(TpError::Cancelled),
            consumed = sink.consume(item) => consumed?,
        }
        stats.record_element();
    }
}
