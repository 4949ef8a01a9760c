//! Sync orchestration

pub mod ports;
mod service;

pub use service::{SyncRecord, SyncRun, SyncService};
