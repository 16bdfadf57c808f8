//! Call-scoped streaming results fed by a single producer task.
//!
//! The producer pushes records and per-record errors into a bounded channel through a
//! [`StreamSink`] and finally returns a [`Completion`]. The completion is recorded before the
//! channel closes, so a consumer that observes the end of the stream can always read it.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures::Stream;
use modkit_errors::AppError;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::context::OpContext;

/// Channel capacity and default store batch size.
pub const BATCH_SIZE: usize = 50;

/// How a producer finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The cursor was drained.
    Exhausted,
    /// A store, cursor or collection failure ended the stream early.
    Aborted,
    /// The caller cancelled or closed the stream.
    Cancelled,
}

enum Item<T> {
    Record(T),
    Error(AppError),
}

/// Producer side of a [`RecordStream`].
pub struct StreamSink<T> {
    tx: mpsc::Sender<Item<T>>,
    cancel: CancellationToken,
}

impl<T> StreamSink<T> {
    async fn send(&self, item: Item<T>) -> bool {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => false,
            res = self.tx.send(item) => res.is_ok(),
        }
    }

    /// Push a record. Returns `false` once the consumer has gone away or cancelled.
    pub async fn record(&self, record: T) -> bool {
        self.send(Item::Record(record)).await
    }

    /// Push an error. Returns `false` once the consumer has gone away or cancelled.
    pub async fn error(&self, err: AppError) -> bool {
        self.send(Item::Error(err)).await
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled() || self.tx.is_closed()
    }

    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Context for the producer's own store calls; cancelled when the stream is.
    #[must_use]
    pub fn context(&self) -> OpContext {
        OpContext::with_cancellation(self.cancel.clone())
    }
}

/// Pull-based stream of mapped records.
///
/// [`RecordStream::next`] yields records only and keeps errors aside for
/// [`RecordStream::errors`]; [`RecordStream::next_item`] and the [`Stream`] impl yield both.
pub struct RecordStream<T> {
    rx: mpsc::Receiver<Item<T>>,
    done: Option<oneshot::Receiver<Completion>>,
    completion: Option<Completion>,
    errors: Vec<AppError>,
    cancel: CancellationToken,
}

impl<T: Send + 'static> RecordStream<T> {
    /// Spawn `producer` on the runtime. The sink's cancellation is a child of `ctx`.
    #[must_use]
    pub fn spawn<F, Fut>(ctx: &OpContext, producer: F) -> Self
    where
        F: FnOnce(StreamSink<T>) -> Fut,
        Fut: Future<Output = Completion> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(BATCH_SIZE);
        let (done_tx, done_rx) = oneshot::channel();
        let cancel = ctx.cancellation().child_token();
        let work = producer(StreamSink {
            tx: tx.clone(),
            cancel: cancel.clone(),
        });

        tokio::spawn(async move {
            let completion = work.await;
            _ = done_tx.send(completion);
            // Last sender: the channel closes only now.
            drop(tx);
        });

        Self {
            rx,
            done: Some(done_rx),
            completion: None,
            errors: Vec::new(),
            cancel,
        }
    }
}

impl<T> RecordStream<T> {
    /// A stream that yields only `err` and then completes as aborted.
    #[must_use]
    pub fn failed(err: AppError) -> Self {
        let (tx, rx) = mpsc::channel(1);
        _ = tx.try_send(Item::Error(err));
        let (done_tx, done_rx) = oneshot::channel();
        _ = done_tx.send(Completion::Aborted);
        Self {
            rx,
            done: Some(done_rx),
            completion: None,
            errors: Vec::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Next record, setting aside any errors met on the way. `None` at the end of the stream.
    pub async fn next(&mut self) -> Option<T> {
        loop {
            match self.next_item().await? {
                Ok(record) => return Some(record),
                Err(err) => self.errors.push(err),
            }
        }
    }

    /// Next record or error, in the order the producer pushed them.
    pub async fn next_item(&mut self) -> Option<Result<T, AppError>> {
        match self.rx.recv().await {
            Some(Item::Record(record)) => Some(Ok(record)),
            Some(Item::Error(err)) => Some(Err(err)),
            None => {
                self.finish().await;
                None
            }
        }
    }

    async fn finish(&mut self) {
        if self.completion.is_some() {
            return;
        }
        let completion = match self.done.take() {
            Some(done) => done.await.unwrap_or(Completion::Aborted),
            None => Completion::Aborted,
        };
        self.completion = Some(completion);
    }

    /// First error set aside by [`RecordStream::next`].
    #[must_use]
    pub fn error(&self) -> Option<&AppError> {
        self.errors.first()
    }

    #[must_use]
    pub fn errors(&self) -> &[AppError] {
        &self.errors
    }

    pub fn take_errors(&mut self) -> Vec<AppError> {
        std::mem::take(&mut self.errors)
    }

    /// Known once the end of the stream has been observed or the stream was closed.
    #[must_use]
    pub fn completion(&self) -> Option<Completion> {
        self.completion
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.completion.is_some()
    }

    /// Stop the producer and discard anything not yet received.
    pub fn close(&mut self) {
        self.cancel.cancel();
        self.rx.close();
        while self.rx.try_recv().is_ok() {}
        if self.completion.is_none() {
            let completion = self
                .done
                .take()
                .and_then(|mut done| done.try_recv().ok())
                .unwrap_or(Completion::Cancelled);
            self.completion = Some(completion);
        }
    }

    /// Drain the stream into records and errors.
    pub async fn collect(mut self) -> (Vec<T>, Vec<AppError>) {
        let mut records = Vec::new();
        while let Some(record) = self.next().await {
            records.push(record);
        }
        (records, self.take_errors())
    }
}

impl<T> Drop for RecordStream<T> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// No field is pinned structurally.
impl<T> Unpin for RecordStream<T> {}

impl<T> Stream for RecordStream<T> {
    type Item = Result<T, AppError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        match ready!(this.rx.poll_recv(cx)) {
            Some(Item::Record(record)) => Poll::Ready(Some(Ok(record))),
            Some(Item::Error(err)) => Poll::Ready(Some(Err(err))),
            None => {
                if this.completion.is_none() {
                    let completion = match this.done.as_mut() {
                        Some(done) => ready!(Pin::new(done).poll(cx)).unwrap_or(Completion::Aborted),
                        None => Completion::Aborted,
                    };
                    this.done = None;
                    this.completion = Some(completion);
                }
                Poll::Ready(None)
            }
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use futures::StreamExt;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn completion_is_recorded_before_the_channel_closes() {
        let ctx = OpContext::new();
        let mut stream = RecordStream::spawn(&ctx, |sink| async move {
            for i in 0..3 {
                if !sink.record(i).await {
                    return Completion::Cancelled;
                }
            }
            Completion::Exhausted
        });
        assert!(stream.completion().is_none());
        let mut seen = Vec::new();
        while let Some(i) = stream.next().await {
            seen.push(i);
        }
        assert_eq!(seen, vec![0, 1, 2]);
        assert_eq!(stream.completion(), Some(Completion::Exhausted));
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn errors_are_set_aside_and_iteration_continues() {
        let ctx = OpContext::new();
        let stream = RecordStream::spawn(&ctx, |sink| async move {
            sink.record(1).await;
            sink.error(AppError::internal(anyhow::anyhow!("bad record"))).await;
            sink.record(2).await;
            Completion::Exhausted
        });
        let (records, errors) = stream.collect().await;
        assert_eq!(records, vec![1, 2]);
        assert_eq!(errors.len(), 1);
    }

    #[tokio::test]
    async fn close_stops_a_blocked_producer() {
        let ctx = OpContext::new();
        let sent = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&sent);
        let (finished_tx, finished_rx) = oneshot::channel();
        let mut stream = RecordStream::spawn(&ctx, move |sink| async move {
            let mut completion = Completion::Exhausted;
            for i in 0..10_000 {
                if !sink.record(i).await {
                    completion = Completion::Cancelled;
                    break;
                }
                counter.fetch_add(1, Ordering::SeqCst);
            }
            _ = finished_tx.send(completion);
            completion
        });
        assert_eq!(stream.next().await, Some(0));
        stream.close();
        assert_eq!(stream.completion(), Some(Completion::Cancelled));
        assert_eq!(finished_rx.await.unwrap(), Completion::Cancelled);
        assert!(sent.load(Ordering::SeqCst) <= BATCH_SIZE + 1);
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn caller_cancellation_reaches_the_producer() {
        let ctx = OpContext::new();
        let mut stream: RecordStream<u32> = RecordStream::spawn(&ctx, |sink| async move {
            sink.cancelled().await;
            Completion::Cancelled
        });
        ctx.cancel();
        assert!(stream.next().await.is_none());
        assert_eq!(stream.completion(), Some(Completion::Cancelled));
    }

    #[tokio::test]
    async fn failed_stream_yields_its_error_once() {
        let mut stream: RecordStream<u32> =
            RecordStream::failed(AppError::invalid_argument(anyhow::anyhow!("bad query")));
        assert!(stream.next().await.is_none());
        assert_eq!(stream.errors().len(), 1);
        assert_eq!(stream.completion(), Some(Completion::Aborted));
    }

    #[tokio::test]
    async fn implements_futures_stream() {
        let ctx = OpContext::new();
        let stream = RecordStream::spawn(&ctx, |sink| async move {
            sink.record("a").await;
            sink.record("b").await;
            Completion::Exhausted
        });
        let items: Vec<_> = stream.map(Result::unwrap).collect().await;
        assert_eq!(items, vec!["a", "b"]);
    }
}
