//! # qdm-sync Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The QDM API adapter (authorization, counts, pages, customer groups)
//! - The SQLite document store
//! - The shared HTTP client
//! - Configuration loading
//!
//! ## Architecture
//! - Implements traits defined in `qdmsync-core`
//! - Depends on `qdmsync-domain` and `qdmsync-core`
//! - Contains all "impure" code (network and disk I/O)

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod config;
pub mod database;
pub mod errors;
pub mod http;
pub mod qdm;

// Re-export commonly used items
pub use database::{Collection, DbManager, SqliteDocumentRepository};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use qdm::{QdmAuthClient, QdmClient, QdmService};
