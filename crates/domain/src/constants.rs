//! Pipeline constants

use std::time::Duration;

/// Timestamp layout used by the QDM API for query parameters and record
/// fields (local time, no offset).
pub const TIME_LAYOUT: &str = "%Y-%m-%dT%H:%M:%S";

/// Fraction of a credential's remaining lifetime after which it is renewed.
pub const RENEW_AFTER: f64 = 0.75;

/// Delay between failed renewal attempts.
pub const RENEW_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Default number of records requested per page.
pub const DEFAULT_PAGE_SIZE: u32 = 300;

/// Default number of records pulled from a stream per tick.
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Default interval between two fetch attempts of a sync driver.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(500);

/// Default per-request HTTP timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Path appended to the configured host to reach the versioned API.
pub const API_PREFIX: &str = "/api/v1";
