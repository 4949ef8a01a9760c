//! # qdm-sync Domain
//!
//! Business domain types for the QDM synchronization pipeline.
//!
//! This crate contains:
//! - Record shapes pulled from the remote API (orders, customers, groups)
//! - Credential, paging, window and progress types
//! - The `QdmSyncError` taxonomy and `Result` alias
//! - Configuration structures and pipeline constants
//!
//! ## Architecture
//! - No dependencies on other qdm-sync crates
//! - Only external dependencies allowed
//! - Pure data structures, no I/O

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
