//! Sync progress reporting

use serde::{Deserialize, Serialize};

/// Snapshot emitted after each persisted batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub total: i64,
    pub current: i64,
}

impl Progress {
    /// Completion percentage; may exceed 100 when the remote grew mid-sync.
    pub fn percent(&self) -> f64 {
        if self.total <= 0 {
            return 0.0;
        }
        #[allow(clippy::cast_precision_loss)]
        let pct = self.current as f64 / self.total as f64 * 100.0;
        pct
    }
}

/// Terminal outcome of a sync run that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub total: i64,
    pub synced: i64,
    /// Whether the run stopped because its owner cancelled it
    pub cancelled: bool,
}
