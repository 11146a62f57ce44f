//! Bridge from a pipeline to an async [`Stream`].

use async_trait::async_trait;
use futures::Stream;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tokio_util::sync::DropGuard;
use tp_error::{Result, TpError};
use tp_traits::{Sink, Stage};
use tracing::debug;

use crate::executor::{execute, RunContext};

/// Sink forwarding every element into a bounded channel.
///
/// `consume` waits for room in the channel, so a slow reader holds the
/// pipeline back. A closed channel ends the run as cancelled.
pub struct ChannelSink<T> {
    tx: mpsc::Sender<Result<T>>,
}

impl<T> ChannelSink<T> {
    pub fn new(tx: mpsc::Sender<Result<T>>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl<T: Send + 'static> Sink<T> for ChannelSink<T> {
    type Output = ();

    async fn consume(&mut self, item: T) -> Result<()> {
        self.tx.send(Ok(item)).await.map_err(|_| {
            debug!("Readable dropped by its consumer");
            TpError::Cancelled
        })
    }

    fn finish(self) -> Result<()> {
        Ok(())
    }
}

/// The output of a pipeline as a `Stream<Item = Result<T>>`.
///
/// Yields the elements in order; a failed run ends with one `Err` item.
/// The stream can be used as the source of another pipeline through
/// [`Pipeline::from_stream`](crate::Pipeline::from_stream). Dropping it
/// cancels the task driving the pipeline.
pub struct ReadableStream<T> {
    rx: mpsc::Receiver<Result<T>>,
    _cancel_on_drop: DropGuard,
}

impl<T> Stream for ReadableStream<T> {
    type Item = Result<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Spawns a task driving `stage` into a new readable.
///
/// `callback` is invoked once when the run ends, with the error if it
/// failed; the same error is then delivered as the stream's last item.
pub(crate) fn spawn_readable<S, C>(stage: S, ctx: RunContext, callback: C) -> ReadableStream<S::Out>
where
    S: Stage + 'static,
    C: FnOnce(Option<&TpError>) + Send + 'static,
{
    let (tx, rx) = mpsc::channel(1);
    let error_tx = tx.clone();
    let cancel_on_drop = ctx.cancel.clone().drop_guard();

    tokio::spawn(async move {
        match execute(stage, ChannelSink::new(tx), ctx).await {
            Ok(_) => callback(None),
            Err(e) => {
                callback(Some(&e));
                // Nobody to tell if the readable is already gone.
                let _ = error_tx.send(Err(e)).await;
            }
        }
    });

    ReadableStream {
        rx,
        _cancel_on_drop: cancel_on_drop,
    }
}
