//! Credential lifecycle

mod credential_manager;
pub mod ports;

pub use credential_manager::{CredentialManager, RenewalPolicy};
