//! Pull iterator over a background page walk
//!
//! A [`RecordStream`] owns the receiving half of the walk's channel. The walk
//! holds a [`StreamState`] handle so it can publish its terminal outcome and
//! observe cancellation without knowing the record type.

use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, OnceLock};

use qdmsync_domain::{QdmSyncError, Result};
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a page walk ended.
#[derive(Debug)]
pub(crate) enum WalkOutcome {
    /// Last page pushed.
    Finished,
    /// Request or decode failure.
    Failed(QdmSyncError),
    /// Cancellation observed, or the receiver went away.
    Cancelled,
}

/// State shared between a stream handle and its producer.
#[derive(Debug)]
pub(crate) struct StreamState {
    total: i64,
    cancel: CancellationToken,
    closed: AtomicBool,
    cause: OnceLock<Option<QdmSyncError>>,
    terminal: OnceLock<QdmSyncError>,
}

impl StreamState {
    pub(crate) fn new(total: i64, cancel: CancellationToken) -> Self {
        Self {
            total,
            cancel,
            closed: AtomicBool::new(false),
            cause: OnceLock::new(),
            terminal: OnceLock::new(),
        }
    }

    pub(crate) fn token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Record the walk's outcome. Must run before the sender is dropped.
    pub(crate) fn finish(&self, outcome: WalkOutcome) {
        match outcome {
            WalkOutcome::Finished => {
                let _ = self.terminal.set(QdmSyncError::EndOfStream);
            }
            WalkOutcome::Failed(err) => {
                let _ = self.terminal.set(err.clone());
                self.close(Some(err));
            }
            WalkOutcome::Cancelled => {}
        }
    }

    /// One-time close. Returns whether this call performed it.
    ///
    /// The cause is stored before the token fires, so anyone woken by the
    /// token sees it.
    fn close(&self, cause: Option<QdmSyncError>) -> bool {
        if self.closed.swap(true, Ordering::AcqRel) {
            return false;
        }
        let _ = self.cause.set(cause);
        self.cancel.cancel();
        true
    }

    fn cause(&self) -> Option<QdmSyncError> {
        self.cause.get().cloned().flatten()
    }

    /// Why the stream stopped before draining, if it did.
    ///
    /// A token cancelled from above without a `close` call aborts an
    /// unfinished walk, which is reported as `Cancelled`.
    fn failure(&self) -> Option<QdmSyncError> {
        if let Some(cause) = self.cause() {
            return Some(cause);
        }
        let finished = matches!(self.terminal.get(), Some(QdmSyncError::EndOfStream));
        if self.cancel.is_cancelled() && !self.closed.load(Ordering::Acquire) && !finished {
            return Some(QdmSyncError::Cancelled("stream cancelled before the walk finished".into()));
        }
        None
    }

    /// Error returned by `fetch` once the stream is closed.
    fn closed_error(&self) -> QdmSyncError {
        self.failure().unwrap_or(QdmSyncError::EndOfStream)
    }

    /// Error returned by `fetch` once the channel is drained.
    fn drained_error(&self) -> QdmSyncError {
        if self.cancel.is_cancelled() {
            return self.closed_error();
        }
        self.terminal.get().cloned().unwrap_or(QdmSyncError::EndOfStream)
    }
}

/// Cancellable, backpressured pull stream of records.
///
/// `count()` is fixed at creation from the upfront count query. Records are
/// pulled in batches with [`fetch`](Self::fetch); the stream ends with
/// [`QdmSyncError::EndOfStream`] or with the walk's error.
pub struct RecordStream<T> {
    state: Arc<StreamState>,
    rx: Mutex<Option<mpsc::Receiver<T>>>,
    consumed: AtomicI64,
}

impl<T> RecordStream<T> {
    pub(crate) fn new(state: Arc<StreamState>, rx: mpsc::Receiver<T>) -> Self {
        Self { state, rx: Mutex::new(Some(rx)), consumed: AtomicI64::new(0) }
    }

    /// Pull up to `batch` records.
    ///
    /// Waits until the batch is full or the channel closes. A partial batch is
    /// returned when the channel closes mid-batch; an empty close yields the
    /// walk's terminal outcome. Once the stream is closed, returns the close
    /// cause, or `EndOfStream` for a clean close.
    pub async fn fetch(&self, batch: usize) -> Result<Vec<T>> {
        let batch = batch.max(1);
        let mut guard = self.rx.lock().await;

        if self.state.cancel.is_cancelled() {
            guard.take();
            return Err(self.state.closed_error());
        }

        let Some(rx) = guard.as_mut() else {
            return Err(self.state.closed_error());
        };

        let mut items = Vec::with_capacity(batch);
        let mut drained = false;
        let mut interrupted = false;
        while items.len() < batch {
            tokio::select! {
                biased;
                () = self.state.cancel.cancelled() => {
                    interrupted = true;
                    break;
                }
                item = rx.recv() => match item {
                    Some(record) => items.push(record),
                    None => {
                        drained = true;
                        break;
                    }
                },
            }
        }

        if interrupted {
            debug!("stream closed during fetch");
            guard.take();
        }

        if items.is_empty() {
            if drained {
                return Err(self.state.drained_error());
            }
            return Err(self.state.closed_error());
        }

        self.consumed.fetch_add(len_i64(items.len()), Ordering::Relaxed);
        Ok(items)
    }

    /// Total reported by the count query.
    pub fn count(&self) -> i64 {
        self.state.total
    }

    /// Records handed out by `fetch` so far.
    pub fn consumed(&self) -> i64 {
        self.consumed.load(Ordering::Relaxed)
    }

    /// Close the stream, stopping the walk and releasing the channel.
    ///
    /// Idempotent: only the first call's cause is kept, and only that call
    /// returns `true`. If a fetch is in flight it releases the receiver itself
    /// when it wakes.
    pub fn close(&self, cause: Option<QdmSyncError>) -> bool {
        if !self.state.close(cause) {
            return false;
        }
        if let Ok(mut guard) = self.rx.try_lock() {
            if let Some(mut rx) = guard.take() {
                rx.close();
            }
        }
        debug!(consumed = self.consumed(), "stream closed");
        true
    }

    /// Resolves once the stream is closed, by its owner or by a walk failure.
    pub fn done(&self) -> impl Future<Output = ()> + Send + '_ {
        self.state.cancel.cancelled()
    }

    /// Close cause, or `Cancelled` when an unfinished walk was cancelled from
    /// above. `None` for a drained or cleanly closed stream.
    pub fn error(&self) -> Option<QdmSyncError> {
        self.state.failure()
    }

    pub fn is_closed(&self) -> bool {
        self.state.closed.load(Ordering::Acquire)
    }
}

impl<T> Drop for RecordStream<T> {
    fn drop(&mut self) {
        self.state.cancel.cancel();
    }
}

impl<T> std::fmt::Debug for RecordStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordStream")
            .field("total", &self.state.total)
            .field("consumed", &self.consumed())
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn len_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
