//! Sync service - drains record streams into the repository

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use qdmsync_domain::{
    Customer, Order, Progress, QdmSyncError, Result, SyncConfig, SyncReport, TimeWindow,
};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, Instrument, Span};

use super::ports::{RecordRepository, RecordSource};
use crate::stream::RecordStream;

const PROGRESS_CAPACITY: usize = 32;

/// A record kind the service knows how to persist.
pub trait SyncRecord: Send + Sync + Sized + 'static {
    /// Collection name used in logs
    const KIND: &'static str;

    fn persist<'a>(
        repository: &'a dyn RecordRepository,
        batch: &'a [Self],
    ) -> BoxFuture<'a, Result<()>>;
}

impl SyncRecord for Order {
    const KIND: &'static str = "orders";

    fn persist<'a>(
        repository: &'a dyn RecordRepository,
        batch: &'a [Self],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { repository.store(batch).await })
    }
}

impl SyncRecord for Customer {
    const KIND: &'static str = "customers";

    fn persist<'a>(
        repository: &'a dyn RecordRepository,
        batch: &'a [Self],
    ) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { repository.store_customers(batch).await })
    }
}

/// Handle to a running sync.
///
/// Progress snapshots arrive in order on [`progress`](Self::progress); the
/// channel closes when the driver stops. [`finish`](Self::finish) yields the
/// terminal outcome.
#[derive(Debug)]
pub struct SyncRun {
    total: i64,
    progress: mpsc::Receiver<Progress>,
    handle: JoinHandle<Result<SyncReport>>,
}

impl SyncRun {
    /// Record count reported when the sync started
    pub fn total(&self) -> i64 {
        self.total
    }

    /// Next progress snapshot, `None` once the driver stopped.
    pub async fn next_progress(&mut self) -> Option<Progress> {
        self.progress.recv().await
    }

    pub fn progress(&mut self) -> &mut mpsc::Receiver<Progress> {
        &mut self.progress
    }

    /// Whether the driver has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the driver to stop.
    ///
    /// Unread progress is discarded. Returns the report on completion or
    /// cancellation and the error that aborted the sync otherwise.
    pub async fn finish(self) -> Result<SyncReport> {
        let Self { handle, progress, .. } = self;
        drop(progress);
        handle.await.map_err(|e| QdmSyncError::Internal(format!("sync driver panicked: {e}")))?
    }
}

/// Sync orchestrator
///
/// Each sync gets its own driver task which, once per tick, pulls a batch
/// from the stream, persists it and publishes progress.
pub struct SyncService {
    source: Arc<dyn RecordSource>,
    repository: Arc<dyn RecordRepository>,
    config: SyncConfig,
    cancel: CancellationToken,
    span: Span,
}

impl SyncService {
    pub fn new(
        source: Arc<dyn RecordSource>,
        repository: Arc<dyn RecordRepository>,
        config: SyncConfig,
        parent: &CancellationToken,
        span: Span,
    ) -> Self {
        Self { source, repository, config, cancel: parent.child_token(), span }
    }

    /// Sync every order created inside `window`.
    ///
    /// Fails with [`QdmSyncError::EmptyResult`] when there is nothing to sync.
    pub async fn sync_orders(&self, window: TimeWindow) -> Result<SyncRun> {
        let stream = self.source.find_orders(window).instrument(self.span.clone()).await?;
        Ok(self.spawn_driver(stream))
    }

    /// Sync every customer created inside `window`.
    pub async fn sync_customers(&self, window: TimeWindow) -> Result<SyncRun> {
        let stream = self.source.find_customers(window).instrument(self.span.clone()).await?;
        Ok(self.spawn_driver(stream))
    }

    /// Fetch and store all customer groups, returning how many were stored.
    pub async fn sync_customer_groups(&self) -> Result<usize> {
        let groups = self.source.find_customer_groups().instrument(self.span.clone()).await?;
        if groups.is_empty() {
            return Ok(0);
        }
        self.repository.store_customer_groups(&groups).await?;
        self.span.in_scope(|| info!(stored = groups.len(), "customer groups stored"));
        Ok(groups.len())
    }

    /// Cancel every running sync.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    fn spawn_driver<T: SyncRecord>(&self, stream: RecordStream<T>) -> SyncRun {
        let total = stream.count();
        let (tx, rx) = mpsc::channel(PROGRESS_CAPACITY);
        let driver = Driver {
            stream,
            repository: Arc::clone(&self.repository),
            progress: tx,
            cancel: self.cancel.clone(),
            tick: self.config.tick_interval(),
            batch_size: self.config.batch_size.max(1),
        };
        let span = info_span!(parent: &self.span, "sync", kind = T::KIND, total);
        let handle = tokio::spawn(driver.run().instrument(span));
        SyncRun { total, progress: rx, handle }
    }
}

impl Drop for SyncService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Driver<T> {
    stream: RecordStream<T>,
    repository: Arc<dyn RecordRepository>,
    progress: mpsc::Sender<Progress>,
    cancel: CancellationToken,
    tick: Duration,
    batch_size: usize,
}

impl<T: SyncRecord> Driver<T> {
    async fn run(self) -> Result<SyncReport> {
        let total = self.stream.count();
        let mut current = 0_i64;
        let report = |synced, cancelled| SyncReport { total, synced, cancelled };

        let mut ticker = interval_at(Instant::now() + self.tick, self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("sync started");

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    self.stream.close(Some(QdmSyncError::Cancelled("sync cancelled".into())));
                    info!(synced = current, "sync cancelled");
                    return Ok(report(current, true));
                }
                () = self.stream.done() => {
                    return match self.stream.error() {
                        None | Some(QdmSyncError::Cancelled(_)) => {
                            info!(synced = current, "stream cancelled");
                            Ok(report(current, true))
                        }
                        Some(err) => {
                            error!(error = %err, synced = current, "sync aborted");
                            Err(err)
                        }
                    };
                }
                _ = ticker.tick() => {}
            }

            let fetched = tokio::select! {
                biased;
                () = self.cancel.cancelled() => continue,
                fetched = self.stream.fetch(self.batch_size) => fetched,
            };

            let batch = match fetched {
                Ok(batch) => batch,
                Err(err) if err.is_end_of_stream() => {
                    self.stream.close(None);
                    info!(synced = current, "sync completed");
                    return Ok(report(current, false));
                }
                Err(err @ QdmSyncError::Cancelled(_)) => {
                    info!(synced = current, error = %err, "sync cancelled");
                    self.stream.close(Some(err));
                    return Ok(report(current, true));
                }
                Err(err) => {
                    error!(error = %err, synced = current, "fetch failed");
                    self.stream.close(Some(err.clone()));
                    return Err(err);
                }
            };

            if let Err(err) = T::persist(self.repository.as_ref(), &batch).await {
                error!(error = %err, batch = batch.len(), "persist failed");
                self.stream.close(Some(err.clone()));
                return Err(err);
            }

            current += i64::try_from(batch.len()).unwrap_or(i64::MAX);
            debug!(current, total, "batch stored");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {}
                () = self.stream.done() => {}
                sent = self.progress.send(Progress { total, current }) => {
                    if sent.is_err() {
                        debug!("progress receiver dropped");
                    }
                }
            }
        }
    }
}
