//! Database implementations

pub mod document_repository;
pub mod manager;

pub use document_repository::*;
pub use manager::*;
