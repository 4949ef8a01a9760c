//! Port interfaces for authentication

use async_trait::async_trait;
use qdmsync_domain::{Credential, Result};

/// Exchanges client credentials for a bearer token.
#[async_trait]
pub trait Authorizer: Send + Sync {
    async fn authorize(&self, client_id: &str, client_secret: &str) -> Result<Credential>;
}

/// Supplies the token attached to outgoing requests.
///
/// Implementations must not block: callers read the token on every request.
pub trait AccessTokenProvider: Send + Sync {
    fn current_token(&self) -> String;
}
