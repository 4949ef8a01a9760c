//! # qdm-sync Core
//!
//! Pipeline logic with no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (traits) for the remote API and the document store
//! - `RecordStream`, the pull iterator over a background page walk
//! - The paged fetcher that feeds record streams
//! - `CredentialManager`, which keeps a bearer token renewed
//! - `SyncService`, which drains streams into the repository on a fixed tick
//!
//! ## Architecture Principles
//! - Only depends on `qdmsync-domain`
//! - No database or HTTP code
//! - All external dependencies via traits

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod auth;
pub mod stream;
pub mod sync;

pub use auth::ports::{AccessTokenProvider, Authorizer};
pub use auth::{CredentialManager, RenewalPolicy};
pub use stream::fetcher::{open_stream, StreamOptions};
pub use stream::ports::PageSource;
pub use stream::RecordStream;
pub use sync::ports::{RecordRepository, RecordSource};
pub use sync::{SyncRecord, SyncRun, SyncService};
