//! QDM API adapter
//!
//! - `auth`: client-credentials exchange ([`Authorizer`](qdmsync_core::Authorizer))
//! - `client`: counts, pages and customer groups behind a bearer token
//! - `pages`: [`PageSource`](qdmsync_core::PageSource) adapters for the fetcher
//! - `service`: [`QdmService`], the [`RecordSource`](qdmsync_core::RecordSource)
//!   handed to the sync service

pub mod auth;
pub mod client;
mod envelope;
pub mod pages;
pub mod params;
pub mod service;

pub use auth::QdmAuthClient;
pub use client::QdmClient;
pub use pages::{CustomerPages, OrderPages};
pub use params::RecordQuery;
pub use service::QdmService;
