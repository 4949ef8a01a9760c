//! Paged fetcher
//!
//! Counts a window, then walks its pages on a background task and flattens
//! them into a bounded channel read through a [`RecordStream`].

use std::sync::Arc;

use qdmsync_domain::constants::DEFAULT_PAGE_SIZE;
use qdmsync_domain::{PageCursor, QdmSyncError, Result, TimeWindow};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use super::ports::PageSource;
use super::record_stream::{RecordStream, StreamState, WalkOutcome};

/// Page walk settings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    pub page_size: u32,
    /// Overrides the default capacity of half a page
    pub channel_capacity: Option<usize>,
}

impl StreamOptions {
    pub fn new(page_size: u32) -> Self {
        Self { page_size, channel_capacity: None }
    }

    pub fn with_channel_capacity(mut self, capacity: Option<usize>) -> Self {
        self.channel_capacity = capacity;
        self
    }

    pub fn capacity(&self) -> usize {
        self.channel_capacity
            .unwrap_or_else(|| usize::try_from(self.page_size / 2).unwrap_or(usize::MAX))
            .max(1)
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

/// Open a record stream over every record of `window`.
///
/// Fails with [`QdmSyncError::EmptyResult`] when the count is zero, in which
/// case no page is requested and no task is started. The walk runs under a
/// child of `parent`, so cancelling `parent` stops it.
pub async fn open_stream<T>(
    source: Arc<dyn PageSource<T>>,
    window: TimeWindow,
    options: StreamOptions,
    parent: &CancellationToken,
) -> Result<RecordStream<T>>
where
    T: Send + 'static,
{
    let total = source.count(&window).await?;
    if total <= 0 {
        debug!(start = %window.start(), end = %window.end(), "window is empty");
        return Err(QdmSyncError::EmptyResult);
    }

    let cursor = PageCursor::first(window, options.page_size);
    let state = Arc::new(StreamState::new(total, parent.child_token()));
    let (tx, rx) = mpsc::channel(options.capacity());

    let walk_state = Arc::clone(&state);
    let span = info_span!("page_walk", total, page_size = cursor.page_size);
    tokio::spawn(
        async move {
            let outcome = walk(source.as_ref(), cursor, &tx, walk_state.token()).await;
            match &outcome {
                WalkOutcome::Finished => info!("page walk finished"),
                WalkOutcome::Failed(err) => warn!(error = %err, "page walk failed"),
                WalkOutcome::Cancelled => debug!("page walk cancelled"),
            }
            walk_state.finish(outcome);
            drop(tx);
        }
        .instrument(span),
    );

    Ok(RecordStream::new(state, rx))
}

async fn walk<T>(
    source: &dyn PageSource<T>,
    mut cursor: PageCursor,
    tx: &mpsc::Sender<T>,
    cancel: &CancellationToken,
) -> WalkOutcome {
    loop {
        let page = tokio::select! {
            biased;
            () = cancel.cancelled() => return WalkOutcome::Cancelled,
            page = source.fetch_page(&cursor) => page,
        };
        let page = match page {
            Ok(page) => page,
            Err(err) => return WalkOutcome::Failed(err),
        };

        debug!(
            page_number = page.page_number,
            page_count = page.page_count,
            records = page.records.len(),
            "page received"
        );

        let is_last = page.is_last();
        for record in page.records {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return WalkOutcome::Cancelled,
                sent = tx.send(record) => {
                    if sent.is_err() {
                        return WalkOutcome::Cancelled;
                    }
                }
            }
        }

        if is_last {
            return WalkOutcome::Finished;
        }
        cursor.advance();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use chrono::{Local, TimeZone};
    use qdmsync_domain::Page;

    use super::*;

    /// Serves `total` sequential integers, optionally failing one page or
    /// never answering for one.
    struct FakeSource {
        total: i64,
        fail_page: Option<u32>,
        stall_page: Option<u32>,
        requested: Mutex<Vec<u32>>,
    }

    impl FakeSource {
        fn new(total: i64) -> Self {
            Self { total, fail_page: None, stall_page: None, requested: Mutex::new(Vec::new()) }
        }

        fn failing_at(mut self, page: u32) -> Self {
            self.fail_page = Some(page);
            self
        }

        fn stalling_at(mut self, page: u32) -> Self {
            self.stall_page = Some(page);
            self
        }

        fn requested(&self) -> Vec<u32> {
            self.requested.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PageSource<i64> for FakeSource {
        async fn count(&self, _window: &TimeWindow) -> Result<i64> {
            Ok(self.total)
        }

        async fn fetch_page(&self, cursor: &PageCursor) -> Result<Page<i64>> {
            self.requested.lock().unwrap().push(cursor.page_number);
            if self.fail_page == Some(cursor.page_number) {
                return Err(QdmSyncError::RemoteApi("Invalid token".into()));
            }
            if self.stall_page == Some(cursor.page_number) {
                std::future::pending::<()>().await;
            }
            let size = i64::from(cursor.page_size);
            let start = (i64::from(cursor.page_number) - 1) * size;
            let end = (start + size).min(self.total);
            let page_count = u32::try_from((self.total + size - 1) / size).unwrap();
            Ok(Page {
                records: (start..end.max(start)).collect(),
                page_number: cursor.page_number,
                page_count,
            })
        }
    }

    fn window() -> TimeWindow {
        TimeWindow::new(
            Local.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Local.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    async fn drain(stream: &RecordStream<i64>, batch: usize) -> (Vec<i64>, QdmSyncError) {
        let mut all = Vec::new();
        loop {
            match stream.fetch(batch).await {
                Ok(items) => all.extend(items),
                Err(err) => return (all, err),
            }
        }
    }

    #[test]
    fn capacity_defaults_to_half_a_page() {
        assert_eq!(StreamOptions::new(300).capacity(), 150);
        assert_eq!(StreamOptions::new(1).capacity(), 1);
        assert_eq!(StreamOptions::new(300).with_channel_capacity(Some(0)).capacity(), 1);
        assert_eq!(StreamOptions::new(300).with_channel_capacity(Some(7)).capacity(), 7);
    }

    #[tokio::test]
    async fn empty_window_requests_no_pages() {
        let source = Arc::new(FakeSource::new(0));
        let result =
            open_stream::<i64>(source.clone(), window(), StreamOptions::new(10), &CancellationToken::new())
                .await;

        assert_eq!(result.unwrap_err(), QdmSyncError::EmptyResult);
        assert!(source.requested().is_empty());
    }

    #[tokio::test]
    async fn yields_every_record_over_sequential_pages() {
        let source = Arc::new(FakeSource::new(25));
        let stream =
            open_stream::<i64>(source.clone(), window(), StreamOptions::new(10), &CancellationToken::new())
                .await
                .unwrap();

        assert_eq!(stream.count(), 25);
        let (records, end) = drain(&stream, 10).await;

        assert_eq!(records, (0..25).collect::<Vec<_>>());
        assert_eq!(end, QdmSyncError::EndOfStream);
        assert_eq!(source.requested(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn page_error_closes_the_stream_with_its_cause() {
        let source = Arc::new(FakeSource::new(25).failing_at(2));
        let options = StreamOptions::new(10).with_channel_capacity(Some(16));
        let stream =
            open_stream::<i64>(source.clone(), window(), options, &CancellationToken::new())
                .await
                .unwrap();

        tokio::time::timeout(Duration::from_secs(1), stream.done()).await.unwrap();

        let expected = QdmSyncError::RemoteApi("Invalid token".into());
        assert_eq!(stream.error(), Some(expected.clone()));
        assert_eq!(stream.fetch(10).await.unwrap_err(), expected);
        assert_eq!(source.requested(), vec![1, 2]);
    }

    #[tokio::test]
    async fn first_page_error_surfaces_from_fetch() {
        let source = Arc::new(FakeSource::new(5).failing_at(1));
        let stream =
            open_stream::<i64>(source, window(), StreamOptions::new(10), &CancellationToken::new())
                .await
                .unwrap();

        assert_eq!(
            stream.fetch(10).await.unwrap_err(),
            QdmSyncError::RemoteApi("Invalid token".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn closing_mid_stream_stops_the_walk() {
        let source = Arc::new(FakeSource::new(1_000));
        let options = StreamOptions::new(10).with_channel_capacity(Some(1));
        let stream =
            open_stream::<i64>(source.clone(), window(), options, &CancellationToken::new())
                .await
                .unwrap();

        assert_eq!(stream.fetch(3).await.unwrap(), vec![0, 1, 2]);
        stream.close(Some(QdmSyncError::Cancelled("consumer gone".into())));

        tokio::time::sleep(Duration::from_millis(100)).await;
        let requested = source.requested();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(source.requested(), requested);
        assert!(requested.len() <= 2);
        assert_eq!(
            stream.fetch(1).await.unwrap_err(),
            QdmSyncError::Cancelled("consumer gone".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_mid_walk_is_reported_as_cancelled() {
        let parent = CancellationToken::new();
        let source = Arc::new(FakeSource::new(25).stalling_at(2));
        let options = StreamOptions::new(10).with_channel_capacity(Some(16));
        let stream = open_stream::<i64>(source.clone(), window(), options, &parent).await.unwrap();

        assert_eq!(stream.fetch(10).await.unwrap(), (0..10).collect::<Vec<_>>());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(source.requested(), vec![1, 2]);

        parent.cancel();

        let err = stream.fetch(10).await.unwrap_err();
        assert!(matches!(err, QdmSyncError::Cancelled(_)), "got {err:?}");
        assert!(matches!(stream.error(), Some(QdmSyncError::Cancelled(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn parent_cancellation_reaches_the_walk() {
        let parent = CancellationToken::new();
        let source = Arc::new(FakeSource::new(1_000));
        let options = StreamOptions::new(10).with_channel_capacity(Some(1));
        let stream = open_stream::<i64>(source.clone(), window(), options, &parent).await.unwrap();

        parent.cancel();
        tokio::time::timeout(Duration::from_secs(1), stream.done()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(source.requested().len() <= 1);
    }
}
