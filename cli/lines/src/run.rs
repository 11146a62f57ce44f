//! Main execution logic for tp-lines.

use anyhow::Result;
use async_trait::async_trait;
use std::convert::Infallible;
use std::io::{BufWriter, Write};
use std::sync::Arc;
use std::time::Duration;
use tp_cli_common::{format_bytes, format_number, format_rate};
use tp_error::TpError;
use tp_pipeline::sink::ForEach;
use tp_pipeline::{CancellationToken, ExecutionStats, Pipeline};
use tp_reader_file::FileChunkReader;
use tp_traits::{ChunkReader, Sink, Stage};
use tracing::debug;

use crate::args::Cli;

/// What a finished run reports on stderr.
#[derive(Debug)]
pub struct RunSummary {
    pub stats: ExecutionStats,
    pub file_size: Option<u64>,
}

/// Writes every element as one line of text.
struct WriteSink<W: Write, F> {
    out: BufWriter<W>,
    render: F,
}

impl<W: Write, F> WriteSink<W, F> {
    fn new(out: W, render: F) -> Self {
        Self {
            out: BufWriter::new(out),
            render,
        }
    }
}

#[async_trait]
impl<T, W, F> Sink<T> for WriteSink<W, F>
where
    T: Send + 'static,
    W: Write + Send,
    F: FnMut(T) -> Result<String> + Send,
{
    type Output = W;

    async fn consume(&mut self, item: T) -> tp_error::Result<()> {
        let text = (self.render)(item).map_err(TpError::sink)?;
        writeln!(self.out, "{}", text).map_err(TpError::sink)
    }

    fn finish(self) -> tp_error::Result<W> {
        self.out
            .into_inner()
            .map_err(|e| TpError::sink(e.into_error()))
    }
}

/// Run the pipeline described by `args`, writing its output to `out`.
pub async fn execute<W>(args: &Cli, out: W, cancel: CancellationToken) -> Result<(RunSummary, W)>
where
    W: Write + Send,
{
    let reader = Arc::new(FileChunkReader::new(args.read_options())?);
    let file_size = match reader.file_metadata(&args.path).await {
        Ok(metadata) => Some(metadata.size_bytes),
        Err(e) => {
            debug!(error = %e, "File metadata unavailable");
            None
        }
    };

    let mut lines = Pipeline::from_reader(reader, args.path.clone())
        .named(args.path.clone())
        .with_cancellation(cancel)
        .lines_with(args.decoding())
        .boxed();
    if let Some(needle) = args.contains.clone() {
        lines = lines
            .filter(move |line| line.contains(needle.as_str()))
            .boxed();
    }
    if let Some(ms) = args.throttle_ms {
        lines = lines.throttle(Duration::from_millis(ms)).boxed();
    }

    let (stats, out) = match args.group {
        Some(size) => {
            let render = |group: Vec<String>| -> Result<String> {
                Ok(serde_json::to_string(&group)?)
            };
            emit(lines.grouped(size)?, args.count, out, render).await?
        }
        None => emit(lines, args.count, out, |line: String| Ok(line)).await?,
    };

    Ok((RunSummary { stats, file_size }, out))
}

/// Drive `pipeline` to `out`, either every element or just their count.
async fn emit<S, W, F>(
    pipeline: Pipeline<S>,
    count_only: bool,
    mut out: W,
    render: F,
) -> Result<(ExecutionStats, W)>
where
    S: Stage,
    W: Write + Send,
    F: FnMut(S::Out) -> Result<String> + Send,
{
    if count_only {
        let outcome = pipeline
            .run(ForEach::new(|_: S::Out| Ok::<_, Infallible>(())))
            .await?;
        writeln!(out, "{}", outcome.stats.elements)?;
        out.flush()?;
        Ok((outcome.stats, out))
    } else {
        let outcome = pipeline.run(WriteSink::new(out, render)).await?;
        Ok((outcome.stats, outcome.output))
    }
}

/// Report a finished run to stderr.
pub fn print_summary(summary: &RunSummary) {
    let stats = &summary.stats;
    eprintln!();
    eprintln!("Pipeline {}:", stats.state);
    eprintln!("  Elements:   {}", format_number(stats.elements));
    if let Some(size) = summary.file_size {
        eprintln!("  File size:  {}", format_bytes(size));
    }
    eprintln!("  Duration:   {:.2}s", stats.elapsed.as_secs_f64());
    if stats.elements > 0 {
        eprintln!(
            "  Throughput: {}",
            format_rate(stats.elements_per_second(), "elements")
        );
    }
}
