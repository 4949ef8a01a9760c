//! Client-credentials exchange against `POST /token/authorize`

use async_trait::async_trait;
use qdmsync_core::Authorizer;
use qdmsync_domain::{Credential, QdmSyncError, Result};
use tracing::{debug, instrument};

use super::envelope::{read_data, AuthData};
use crate::http::HttpClient;

/// Authorizer backed by the QDM token endpoint.
pub struct QdmAuthClient {
    http: HttpClient,
}

impl QdmAuthClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl Authorizer for QdmAuthClient {
    #[instrument(skip(self, client_secret), err)]
    async fn authorize(&self, client_id: &str, client_secret: &str) -> Result<Credential> {
        let request = self
            .http
            .post("/token/authorize")
            .basic_auth(client_id, Some(client_secret))
            .header(reqwest::header::ACCEPT, "application/json");

        let response = self.http.send(request).await?;
        let data: AuthData = read_data(response, QdmSyncError::Auth).await?;
        let credential = data.into_credential()?;

        debug!(store_uid = %credential.store_uid, expires_at = %credential.expires_at, "token issued");
        Ok(credential)
    }
}
