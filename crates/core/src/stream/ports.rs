//! Port interfaces for paged collections

use async_trait::async_trait;
use qdmsync_domain::{Page, PageCursor, Result, TimeWindow};

/// A remote collection that can be counted and read page by page.
#[async_trait]
pub trait PageSource<T>: Send + Sync {
    /// Number of records created inside the window
    async fn count(&self, window: &TimeWindow) -> Result<i64>;

    /// Fetch the page the cursor points at
    async fn fetch_page(&self, cursor: &PageCursor) -> Result<Page<T>>;
}
