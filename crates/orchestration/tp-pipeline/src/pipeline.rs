//! Typed pipeline builder and terminal operations.

use futures::future::BoxFuture;
use futures::{FutureExt, Stream, TryStreamExt};
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tp_error::{Result, SourceError, TpError};
use tp_reader_file::FileChunkReader;
use tp_stages::{AsyncMap, Filter, Grouped, LineDecoding, LineSplitter, Map, Throttle};
use tp_traits::{ChunkReader, Sink, Stage};
use tp_types::ReadOptions;
use tracing::debug;

use crate::executor::{execute, RunContext};
use crate::sink::{spawn_readable, Collect, ForEach, ReadableStream, Reduce};
use crate::source::{ReaderSource, StreamSource};
use crate::stats::RunOutcome;

/// Name used for runs that were not given one.
const DEFAULT_NAME: &str = "pipeline";

/// A chain of stages ending in `S`.
///
/// Every builder call consumes the pipeline and returns a new one whose
/// element type is that of the appended stage, so type mismatches between
/// adjacent stages are compile errors. Building performs no I/O; work starts
/// when a terminal operation is awaited, and terminal operations consume the
/// pipeline.
///
/// # Example
///
/// ```ignore
/// use tp_pipeline::Pipeline;
/// use tp_types::ReadOptions;
///
/// let lines = Pipeline::from_file("data/test01.txt", ReadOptions::default())?
///     .lines()
///     .map(|line| line.replace("line", "foobar"))
///     .filter(|line| line != "foobar0")
///     .to_vec()
///     .await?;
/// ```
pub struct Pipeline<S> {
    stage: S,
    name: String,
    cancel: CancellationToken,
}

impl Pipeline<ReaderSource> {
    /// Pipeline over the chunks of a local file.
    ///
    /// The options are validated here; the file is opened on the first pull,
    /// so a missing file surfaces as the terminal operation's error.
    pub fn from_file(path: impl Into<String>, options: ReadOptions) -> Result<Self> {
        let path = path.into();
        let reader = FileChunkReader::new(options)?;
        Ok(Self::from_reader(Arc::new(reader), path.clone()).named(path))
    }

    /// Pipeline over the chunks a [`ChunkReader`] yields for `uri`.
    pub fn from_reader(reader: Arc<dyn ChunkReader>, uri: impl Into<String>) -> Self {
        Self::from_stage(ReaderSource::new(reader, uri))
    }
}

impl<T: Send + 'static> Pipeline<StreamSource<T>> {
    /// Pipeline over an existing stream of fallible elements.
    ///
    /// An `Err` item from the stream fails the run with that error.
    pub fn from_stream<St>(stream: St) -> Self
    where
        St: Stream<Item = Result<T>> + Send + 'static,
    {
        Self::from_stage(StreamSource::new(Box::pin(stream)))
    }

    /// Pipeline over a stream whose errors are not [`TpError`]s.
    ///
    /// An `Err` item fails the run with [`SourceError::Upstream`] carrying the
    /// error's message.
    pub fn from_try_stream<St, E>(stream: St) -> Self
    where
        St: Stream<Item = std::result::Result<T, E>> + Send + 'static,
        E: std::fmt::Display + 'static,
    {
        Self::from_stream(stream.map_err(upstream_error))
    }

    /// Pipeline over an in-memory sequence.
    #[allow(clippy::should_implement_trait)]
    pub fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: Send + 'static,
    {
        Self::from_stream(futures::stream::iter(iter.into_iter().map(Ok)))
    }
}

impl<S: Stage> Pipeline<S> {
    /// Pipeline starting at a custom source stage.
    pub fn from_stage(stage: S) -> Self {
        Self {
            stage,
            name: DEFAULT_NAME.to_string(),
            cancel: CancellationToken::new(),
        }
    }

    /// Name of this pipeline, as recorded on its tracing span.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the name recorded on the run's tracing span.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Stops the run with [`TpError::Cancelled`] once `token` is cancelled.
    ///
    /// A transform suspended at that moment is dropped without being awaited.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Appends the stage built from the current last stage.
    fn append<N: Stage>(self, build: impl FnOnce(S) -> N) -> Pipeline<N> {
        let Self {
            stage,
            name,
            cancel,
        } = self;
        let stage = build(stage);
        debug!(pipeline = %name, stage = stage.name(), "Appended stage");
        Pipeline {
            stage,
            name,
            cancel,
        }
    }

    fn try_append<N: Stage>(self, build: impl FnOnce(S) -> Result<N>) -> Result<Pipeline<N>> {
        let Self {
            stage,
            name,
            cancel,
        } = self;
        let stage = build(stage)?;
        debug!(pipeline = %name, stage = stage.name(), "Appended stage");
        Ok(Pipeline {
            stage,
            name,
            cancel,
        })
    }

    /// Erases the stage chain's type.
    ///
    /// Lets a host append stages conditionally, at the cost of one dynamic
    /// dispatch per stage and pull.
    pub fn boxed(self) -> Pipeline<Box<dyn Stage<Out = S::Out>>>
    where
        S: 'static,
    {
        Pipeline {
            stage: Box::new(self.stage),
            name: self.name,
            cancel: self.cancel,
        }
    }

    /// Splits byte chunks into text lines, decoding invalid UTF-8 lossily.
    pub fn lines(self) -> Pipeline<LineSplitter<S>>
    where
        S::Out: AsRef<[u8]>,
    {
        self.lines_with(LineDecoding::Lossy)
    }

    /// Splits byte chunks into text lines with the given decoding.
    pub fn lines_with(self, decoding: LineDecoding) -> Pipeline<LineSplitter<S>>
    where
        S::Out: AsRef<[u8]>,
    {
        self.append(|upstream| LineSplitter::with_decoding(upstream, decoding))
    }

    /// Transforms every element.
    #[allow(clippy::type_complexity)]
    pub fn map<U, F>(
        self,
        mut f: F,
    ) -> Pipeline<Map<S, impl FnMut(S::Out) -> std::result::Result<U, Infallible> + Send>>
    where
        F: FnMut(S::Out) -> U + Send,
        U: Send + 'static,
    {
        self.try_map(move |item| Ok::<_, Infallible>(f(item)))
    }

    /// Transforms every element; an `Err` fails the run.
    pub fn try_map<U, E, F>(self, f: F) -> Pipeline<Map<S, F>>
    where
        F: FnMut(S::Out) -> std::result::Result<U, E> + Send,
        U: Send + 'static,
        E: Into<anyhow::Error>,
    {
        self.append(|upstream| Map::new(upstream, f))
    }

    /// Transforms every element with a future, one element at a time.
    #[allow(clippy::type_complexity)]
    pub fn map_async<U, Fut, F>(
        self,
        mut f: F,
    ) -> Pipeline<
        AsyncMap<
            S,
            impl FnMut(S::Out) -> BoxFuture<'static, std::result::Result<U, Infallible>> + Send,
        >,
    >
    where
        F: FnMut(S::Out) -> Fut + Send,
        Fut: Future<Output = U> + Send + 'static,
        U: Send + 'static,
    {
        self.try_map_async(move |item| f(item).map(Ok::<U, Infallible>).boxed())
    }

    /// Transforms every element with a fallible future, one element at a time.
    pub fn try_map_async<U, E, Fut, F>(self, f: F) -> Pipeline<AsyncMap<S, F>>
    where
        F: FnMut(S::Out) -> Fut + Send,
        Fut: Future<Output = std::result::Result<U, E>> + Send + 'static,
        U: Send + 'static,
        E: Into<anyhow::Error>,
    {
        self.append(|upstream| AsyncMap::new(upstream, f))
    }

    /// Keeps the elements for which `predicate` returns true.
    #[allow(clippy::type_complexity)]
    pub fn filter<P>(
        self,
        mut predicate: P,
    ) -> Pipeline<Filter<S, impl FnMut(&S::Out) -> std::result::Result<bool, Infallible> + Send>>
    where
        P: FnMut(&S::Out) -> bool + Send,
    {
        self.try_filter(move |item: &S::Out| Ok::<_, Infallible>(predicate(item)))
    }

    /// Keeps the elements for which `predicate` returns `Ok(true)`; an `Err`
    /// fails the run.
    pub fn try_filter<E, P>(self, predicate: P) -> Pipeline<Filter<S, P>>
    where
        P: FnMut(&S::Out) -> std::result::Result<bool, E> + Send,
        E: Into<anyhow::Error>,
    {
        self.append(|upstream| Filter::new(upstream, predicate))
    }

    /// Collects elements into groups of `size`, the last one possibly shorter.
    ///
    /// Fails with a configuration error if `size` is zero.
    pub fn grouped(self, size: usize) -> Result<Pipeline<Grouped<S>>> {
        self.try_append(|upstream| Grouped::new(upstream, size))
    }

    /// Delays every element by `delay`.
    pub fn throttle(self, delay: Duration) -> Pipeline<Throttle<S>> {
        self.append(|upstream| Throttle::new(upstream, delay))
    }

    /// Drives the pipeline into `sink` and returns its output with run stats.
    pub async fn run<K>(self, sink: K) -> Result<RunOutcome<K::Output>>
    where
        K: Sink<S::Out>,
    {
        let ctx = RunContext {
            name: self.name,
            cancel: self.cancel,
        };
        execute(self.stage, sink, ctx).await
    }

    /// Runs `f` for every element.
    pub async fn foreach<F>(self, mut f: F) -> Result<()>
    where
        F: FnMut(S::Out) + Send,
    {
        self.try_foreach(move |item| {
            f(item);
            Ok::<_, Infallible>(())
        })
        .await
    }

    /// Runs `f` for every element; an `Err` fails the run. Effects of
    /// earlier elements are kept.
    pub async fn try_foreach<E, F>(self, f: F) -> Result<()>
    where
        F: FnMut(S::Out) -> std::result::Result<(), E> + Send,
        E: Into<anyhow::Error>,
    {
        self.run(ForEach::new(f))
            .await
            .map(|outcome| outcome.output)
    }

    /// Folds every element into `initial`.
    pub async fn reduce<A, F>(self, mut f: F, initial: A) -> Result<A>
    where
        F: FnMut(A, S::Out) -> A + Send,
        A: Send,
    {
        self.try_reduce(move |acc, item| Ok::<_, Infallible>(f(acc, item)), initial)
            .await
    }

    /// Folds every element into `initial`; an `Err` fails the run.
    pub async fn try_reduce<A, E, F>(self, f: F, initial: A) -> Result<A>
    where
        F: FnMut(A, S::Out) -> std::result::Result<A, E> + Send,
        A: Send,
        E: Into<anyhow::Error>,
    {
        self.run(Reduce::new(f, initial))
            .await
            .map(|outcome| outcome.output)
    }

    /// Counts the elements reaching the end of the chain.
    pub async fn count(self) -> Result<u64> {
        self.run(ForEach::new(|_: S::Out| Ok::<_, Infallible>(())))
            .await
            .map(|outcome| outcome.stats.elements)
    }

    /// Collects every element, in order.
    pub async fn to_vec(self) -> Result<Vec<S::Out>> {
        self.run(Collect::new()).await.map(|outcome| outcome.output)
    }

    /// Runs the pipeline on a spawned task and returns its output as a stream.
    ///
    /// `callback` is notified once when the run ends, with the error if it
    /// failed. Dropping the returned stream cancels the run; cancelling the
    /// pipeline's token does too.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn to_readable<C>(self, callback: C) -> ReadableStream<S::Out>
    where
        S: 'static,
        C: FnOnce(Option<&TpError>) + Send + 'static,
    {
        let ctx = RunContext {
            name: self.name,
            cancel: self.cancel.child_token(),
        };
        spawn_readable(self.stage, ctx, callback)
    }
}

fn upstream_error<E: std::fmt::Display>(error: E) -> TpError {
    SourceError::Upstream(error.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::sync::oneshot;
    use tp_error::{ConfigError, ErrorKind, StageKind};
    use tp_types::PipelineState;

    fn create_test_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[tokio::test]
    async fn test_map_then_filter_order() {
        let result = Pipeline::from_iter(1..=6)
            .map(|x| x * 2)
            .filter(|x| x % 3 == 0)
            .to_vec()
            .await
            .unwrap();
        assert_eq!(result, vec![6, 12]);
    }

    #[tokio::test]
    async fn test_append_order_matters() {
        let map_first = Pipeline::from_iter(1..=5)
            .map(|x| x + 1)
            .filter(|x| x % 2 == 0)
            .to_vec()
            .await
            .unwrap();
        let filter_first = Pipeline::from_iter(1..=5)
            .filter(|x| x % 2 == 0)
            .map(|x| x + 1)
            .to_vec()
            .await
            .unwrap();

        assert_eq!(map_first, vec![2, 4, 6]);
        assert_eq!(filter_first, vec![3, 5]);
    }

    #[tokio::test]
    async fn test_error_aborts_with_bounded_side_effects() {
        let mut effects = Vec::new();
        let result = Pipeline::from_iter(1..=10)
            .try_map(|x: i32| {
                if x == 3 {
                    anyhow::bail!("element {} is invalid", x);
                }
                Ok(x)
            })
            .foreach(|x| effects.push(x))
            .await;

        match result {
            Err(TpError::Stage { stage, .. }) => assert_eq!(stage, StageKind::Map),
            other => panic!("Expected stage error, got: {:?}", other),
        }
        assert!(effects.len() <= 3);
        assert_eq!(effects, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_sink_error_aborts() {
        let mut effects = Vec::new();
        let result = Pipeline::from_iter(1..=10)
            .try_foreach(|x: i32| {
                if x == 3 {
                    anyhow::bail!("cannot store {}", x);
                }
                effects.push(x);
                Ok(())
            })
            .await;

        let error = result.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::External);
        assert_eq!(effects, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_map_async_preserves_order() {
        let result = Pipeline::from_iter(0..5u64)
            .map_async(|x| async move {
                tokio::time::sleep(Duration::from_millis((5 - x) * 4)).await;
                x * 10
            })
            .to_vec()
            .await
            .unwrap();
        assert_eq!(result, vec![0, 10, 20, 30, 40]);
    }

    #[tokio::test]
    async fn test_try_map_async_error() {
        let result = Pipeline::from_iter(vec!["a", "b"])
            .try_map_async(|s| async move {
                if s == "b" {
                    Err(anyhow::anyhow!("lookup of {} failed", s))
                } else {
                    Ok(s.len())
                }
            })
            .to_vec()
            .await;

        assert_eq!(result.unwrap_err().stage_kind(), Some(StageKind::MapAsync));
    }

    #[tokio::test]
    async fn test_grouped_sizes() {
        let groups = Pipeline::from_iter(0..13)
            .grouped(5)
            .unwrap()
            .to_vec()
            .await
            .unwrap();

        let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![5, 5, 3]);
    }

    #[test]
    fn test_grouped_zero_is_config_error() {
        let result = Pipeline::from_iter(0..3).grouped(0);
        assert!(matches!(
            result,
            Err(TpError::Config(ConfigError::InvalidGroupSize(0)))
        ));
    }

    #[tokio::test]
    async fn test_file_lines_end_to_end() {
        let file = create_test_file("line0\nline1\nline2\nline3\nline4\nline5");
        let options = ReadOptions::new().with_buffer_size(4);

        let result = Pipeline::from_file(file.path().to_str().unwrap(), options)
            .unwrap()
            .lines()
            .map(|line| line.replace("line", "foobar"))
            .filter(|line| line != "foobar0")
            .to_vec()
            .await
            .unwrap();

        assert_eq!(
            result,
            vec!["foobar1", "foobar2", "foobar3", "foobar4", "foobar5"]
        );
    }

    #[tokio::test]
    async fn test_missing_file_fails_at_run_not_build() {
        let pipeline = Pipeline::from_file("/nonexistent/input.txt", ReadOptions::new()).unwrap();
        assert_eq!(pipeline.name(), "/nonexistent/input.txt");

        let result = pipeline.lines().count().await;
        assert!(matches!(
            result,
            Err(TpError::Source(SourceError::NotFound(_)))
        ));
    }

    #[test]
    fn test_invalid_read_options_fail_at_build() {
        let options = ReadOptions::new().with_start(10).with_end(2);
        let result = Pipeline::from_file("/tmp/whatever.txt", options);
        assert!(matches!(result, Err(TpError::Config(_))));
    }

    #[tokio::test]
    async fn test_reduce_and_count() {
        let sum = Pipeline::from_iter(1..=4)
            .reduce(|acc: i32, x| acc + x, 0)
            .await
            .unwrap();
        assert_eq!(sum, 10);

        let joined = Pipeline::from_iter(vec!["a", "b"])
            .try_reduce(
                |mut acc: String, s| {
                    acc.push_str(s);
                    Ok::<_, Infallible>(acc)
                },
                String::new(),
            )
            .await
            .unwrap();
        assert_eq!(joined, "ab");

        let count = Pipeline::from_iter(0..6).count().await.unwrap();
        assert_eq!(count, 6);
    }

    #[tokio::test]
    async fn test_boxed_allows_conditional_stages() {
        for keep_odd in [false, true] {
            let mut pipeline = Pipeline::from_iter(1..=6).map(|x| x * 10).boxed();
            if keep_odd {
                pipeline = pipeline.filter(|x| (x / 10) % 2 == 1).boxed();
            }
            let result = pipeline.to_vec().await.unwrap();
            let expected = if keep_odd {
                vec![10, 30, 50]
            } else {
                vec![10, 20, 30, 40, 50, 60]
            };
            assert_eq!(result, expected);
        }
    }

    #[tokio::test]
    async fn test_run_reports_stats() {
        let outcome = Pipeline::from_iter(0..4)
            .named("stats-test")
            .run(Collect::new())
            .await
            .unwrap();

        assert_eq!(outcome.output, vec![0, 1, 2, 3]);
        assert_eq!(outcome.stats.state, PipelineState::Completed);
        assert_eq!(outcome.stats.elements, 4);
    }

    #[tokio::test]
    async fn test_stream_source_error_fails_run() {
        let items: Vec<Result<u32>> = vec![
            Ok(1),
            Err(SourceError::Upstream("socket closed".into()).into()),
            Ok(3),
        ];
        let result = Pipeline::from_stream(futures::stream::iter(items))
            .to_vec()
            .await;
        assert!(matches!(
            result,
            Err(TpError::Source(SourceError::Upstream(_)))
        ));
    }

    #[tokio::test]
    async fn test_try_stream_error_becomes_upstream_error() {
        let items: Vec<std::result::Result<u32, std::io::Error>> = vec![
            Ok(1),
            Ok(2),
            Err(std::io::Error::other("connection reset")),
            Ok(4),
        ];
        let mut seen = Vec::new();
        let result = Pipeline::from_try_stream(futures::stream::iter(items))
            .foreach(|x| seen.push(x))
            .await;

        assert_eq!(seen, vec![1, 2]);
        match result {
            Err(TpError::Source(SourceError::Upstream(message))) => {
                assert_eq!(message, "connection reset");
            }
            other => panic!("Expected upstream error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancellation_while_suspended() {
        let token = CancellationToken::new();
        let pipeline = Pipeline::from_iter(0..10)
            .map_async(|x| async move {
                tokio::time::sleep(Duration::from_secs(60)).await;
                x
            })
            .with_cancellation(token.clone());

        let handle = tokio::spawn(pipeline.to_vec());
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("cancelled run should end promptly")
            .unwrap();
        assert!(matches!(result, Err(TpError::Cancelled)));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_pulls_nothing() {
        let token = CancellationToken::new();
        token.cancel();

        let mut pulled = 0;
        let result = Pipeline::from_iter(0..10)
            .map(|x| {
                pulled += 1;
                x
            })
            .with_cancellation(token)
            .to_vec()
            .await;

        assert!(result.unwrap_err().is_cancelled());
        assert_eq!(pulled, 0);
    }

    #[tokio::test]
    async fn test_readable_round_trip() {
        let (done_tx, done_rx) = oneshot::channel();
        let readable = Pipeline::from_iter(vec!["a", "b", "c"])
            .map(|s| s.to_uppercase())
            .to_readable(move |error: Option<&TpError>| {
                let _ = done_tx.send(error.is_none());
            });

        let result = Pipeline::from_stream(readable)
            .map(|s| format!("{}!", s))
            .to_vec()
            .await
            .unwrap();

        assert_eq!(result, vec!["A!", "B!", "C!"]);
        assert!(done_rx.await.unwrap());
    }

    #[tokio::test]
    async fn test_readable_callback_sees_error() {
        let (done_tx, done_rx) = oneshot::channel();
        let mut readable = Pipeline::from_iter(1..=3)
            .try_map(|x: i32| {
                if x == 2 {
                    anyhow::bail!("bad {}", x);
                }
                Ok(x)
            })
            .to_readable(move |error: Option<&TpError>| {
                let _ = done_tx.send(error.map(|e| e.kind()));
            });

        assert_eq!(readable.next().await.unwrap().unwrap(), 1);
        assert!(matches!(
            readable.next().await,
            Some(Err(TpError::Stage { .. }))
        ));
        assert!(readable.next().await.is_none());
        assert_eq!(done_rx.await.unwrap(), Some(ErrorKind::Stage));
    }

    #[tokio::test]
    async fn test_dropping_readable_cancels_run() {
        let (done_tx, done_rx) = oneshot::channel();
        let callback = move |error: Option<&TpError>| {
            let _ = done_tx.send(error.map(|e| e.is_cancelled()));
        };
        let mut readable = Pipeline::from_iter(0u64..).to_readable(callback);

        assert_eq!(readable.next().await.unwrap().unwrap(), 0);
        drop(readable);

        let cancelled = tokio::time::timeout(Duration::from_secs(5), done_rx)
            .await
            .expect("driver should stop once the readable is dropped")
            .unwrap();
        assert_eq!(cancelled, Some(true));
    }
}
