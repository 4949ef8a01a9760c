//! Credential manager with background renewal
//!
//! Manages the bearer token lifecycle:
//! - Initial authorization (failure is fatal to the caller)
//! - Renewal at a fraction of the remaining lifetime
//! - Unbounded retries on renewal failure, spaced by a fixed delay
//! - Non-blocking reads of the current token

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use qdmsync_domain::constants::{RENEW_AFTER, RENEW_RETRY_DELAY};
use qdmsync_domain::{Credential, Result};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, Instrument, Span};

use super::ports::{AccessTokenProvider, Authorizer};

/// When to renew and how long to wait between failed attempts
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenewalPolicy {
    /// Fraction of the remaining lifetime after which renewal starts
    pub renew_after: f64,
    pub retry_delay: Duration,
}

impl RenewalPolicy {
    /// Delay before renewing `credential`, never shorter than `retry_delay`
    /// so an already expired token cannot spin the renewal loop.
    pub fn renewal_delay(&self, credential: &Credential) -> Duration {
        credential
            .remaining(Utc::now())
            .mul_f64(self.renew_after.clamp(0.0, 1.0))
            .max(self.retry_delay)
    }
}

impl Default for RenewalPolicy {
    fn default() -> Self {
        Self { renew_after: RENEW_AFTER, retry_delay: RENEW_RETRY_DELAY }
    }
}

/// Owns the current credential and keeps it renewed.
///
/// Readers get a snapshot through a watch channel, so `current_token()`
/// never waits on a renewal in progress.
pub struct CredentialManager {
    current: watch::Receiver<Arc<Credential>>,
    cancel: CancellationToken,
}

impl CredentialManager {
    /// Authorize once and start the renewal task.
    ///
    /// Returns the authorization error if the first attempt fails. The renewal
    /// task stops when `parent` is cancelled or the manager is dropped.
    pub async fn start(
        authorizer: Arc<dyn Authorizer>,
        client_id: String,
        client_secret: String,
        policy: RenewalPolicy,
        parent: &CancellationToken,
        span: Span,
    ) -> Result<Self> {
        let credential = authorizer
            .authorize(&client_id, &client_secret)
            .instrument(span.clone())
            .await?;
        span.in_scope(|| {
            info!(
                store_uid = %credential.store_uid,
                expires_at = %credential.expires_at,
                "authorized"
            );
        });

        let (tx, rx) = watch::channel(Arc::new(credential));
        let cancel = parent.child_token();

        let renewal = Renewal { authorizer, client_id, client_secret, policy, tx, cancel: cancel.clone() };
        tokio::spawn(renewal.run().instrument(span));

        Ok(Self { current: rx, cancel })
    }

    /// Snapshot of the installed credential
    pub fn credential(&self) -> Arc<Credential> {
        Arc::clone(&self.current.borrow())
    }

    /// Receiver notified on every install
    pub fn subscribe(&self) -> watch::Receiver<Arc<Credential>> {
        self.current.clone()
    }

    /// Stop scheduling renewals.
    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl AccessTokenProvider for CredentialManager {
    fn current_token(&self) -> String {
        self.current.borrow().token.clone()
    }
}

impl Drop for CredentialManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

struct Renewal {
    authorizer: Arc<dyn Authorizer>,
    client_id: String,
    client_secret: String,
    policy: RenewalPolicy,
    tx: watch::Sender<Arc<Credential>>,
    cancel: CancellationToken,
}

impl Renewal {
    async fn run(self) {
        loop {
            let wait = self.policy.renewal_delay(&self.tx.borrow());
            debug!(wait_secs = wait.as_secs(), "next renewal scheduled");

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    info!("renewal stopped");
                    return;
                }
                () = tokio::time::sleep(wait) => {}
            }

            let Some(credential) = self.renew().await else {
                info!("renewal stopped");
                return;
            };

            info!(expires_at = %credential.expires_at, "token refreshed");
            self.tx.send_replace(Arc::new(credential));
        }
    }

    /// Retry until success. `None` once cancelled between attempts.
    async fn renew(&self) -> Option<Credential> {
        loop {
            match self.authorizer.authorize(&self.client_id, &self.client_secret).await {
                Ok(credential) => return Some(credential),
                Err(err) => error!(error = %err, "token renewal failed"),
            }

            tokio::select! {
                biased;
                () = self.cancel.cancelled() => return None,
                () = tokio::time::sleep(self.policy.retry_delay) => {}
            }
        }
    }
}
