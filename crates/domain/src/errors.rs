//! Error types used throughout the pipeline

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Main error type for qdm-sync
///
/// `EndOfStream` and `EmptyResult` are terminal signals rather than failures;
/// callers are expected to match on them explicitly.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum QdmSyncError {
    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote API error: {0}")]
    RemoteApi(String),

    #[error("No records in the requested window")]
    EmptyResult,

    #[error("End of stream")]
    EndOfStream,

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl QdmSyncError {
    /// Whether this is the expected terminal signal of a drained stream.
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, Self::EndOfStream)
    }

    /// Whether the remote reported zero records for a window.
    pub fn is_empty_result(&self) -> bool {
        matches!(self, Self::EmptyResult)
    }

    /// Stable label suitable for structured log fields.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::Transport(_) => "transport",
            Self::RemoteApi(_) => "remote_api",
            Self::EmptyResult => "empty_result",
            Self::EndOfStream => "end_of_stream",
            Self::Persistence(_) => "persistence",
            Self::Config(_) => "config",
            Self::InvalidInput(_) => "invalid_input",
            Self::Cancelled(_) => "cancelled",
            Self::Internal(_) => "internal",
        }
    }
}

/// Result type alias for qdm-sync operations
pub type Result<T> = std::result::Result<T, QdmSyncError>;
