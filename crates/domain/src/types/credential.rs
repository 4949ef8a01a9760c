//! Bearer credential issued by the authorize endpoint

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A bearer token plus its expiry.
///
/// Credentials are immutable snapshots: renewal installs a new value rather
/// than mutating the current one.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub token: String,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
    /// Store identifier reported alongside the token
    pub store_uid: String,
    pub message: String,
}

impl Credential {
    /// Time left before the token expires, clamped to zero.
    pub fn remaining(&self, now: DateTime<Utc>) -> std::time::Duration {
        (self.expires_at - now).to_std().unwrap_or_default()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("token_type", &self.token_type)
            .field("expires_at", &self.expires_at)
            .field("store_uid", &self.store_uid)
            .finish_non_exhaustive()
    }
}
