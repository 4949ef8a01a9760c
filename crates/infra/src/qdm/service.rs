//! QDM service - the remote side of a sync
//!
//! Wires the HTTP client, the credential manager and the page sources
//! together and exposes them as a [`RecordSource`].

use std::sync::Arc;

use async_trait::async_trait;
use qdmsync_core::{
    open_stream, AccessTokenProvider, CredentialManager, PageSource, RecordSource, RecordStream,
    RenewalPolicy, StreamOptions,
};
use qdmsync_domain::{
    Credential, Customer, CustomerGroup, Order, QdmConfig, Result, SyncConfig, TimeWindow,
};
use tokio_util::sync::CancellationToken;
use tracing::{info, Instrument, Span};

use super::auth::QdmAuthClient;
use super::client::QdmClient;
use super::pages::{CustomerPages, OrderPages};
use crate::http::HttpClient;

/// Authorized connection to the QDM API.
///
/// Owns a cancellation root: closing the service stops token renewal and
/// every stream opened through it.
pub struct QdmService {
    client: Arc<QdmClient>,
    credentials: Arc<CredentialManager>,
    options: StreamOptions,
    cancel: CancellationToken,
    span: Span,
}

impl QdmService {
    /// Authorize against the API and start background token renewal.
    ///
    /// # Errors
    /// Fails when the HTTP client cannot be built or the first authorization
    /// is rejected.
    pub async fn connect(
        config: &QdmConfig,
        sync: &SyncConfig,
        parent: &CancellationToken,
        span: Span,
    ) -> Result<Self> {
        let http = HttpClient::builder(config.api_url())
            .timeout(config.request_timeout())
            .user_agent(concat!("qdm-sync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let cancel = parent.child_token();
        let authorizer = Arc::new(QdmAuthClient::new(http.clone()));
        let credentials = Arc::new(
            CredentialManager::start(
                authorizer,
                config.client_id.clone(),
                config.client_secret.clone(),
                RenewalPolicy::default(),
                &cancel,
                span.clone(),
            )
            .await?,
        );

        let tokens: Arc<dyn AccessTokenProvider> = credentials.clone();
        let client = Arc::new(QdmClient::new(http, tokens));
        let options =
            StreamOptions::new(config.page_size).with_channel_capacity(sync.channel_capacity);

        span.in_scope(|| info!(page_size = config.page_size, "qdm service connected"));
        Ok(Self { client, credentials, options, cancel, span })
    }

    /// Currently installed credential
    pub fn credential(&self) -> Arc<Credential> {
        self.credentials.credential()
    }

    pub fn client(&self) -> &Arc<QdmClient> {
        &self.client
    }

    pub async fn order_count(&self, window: TimeWindow) -> Result<i64> {
        self.client.order_count(window, None).await
    }

    pub async fn customer_count(&self, window: TimeWindow) -> Result<i64> {
        self.client.customer_count(window).await
    }

    /// Stream the orders one customer placed inside `window`.
    pub async fn find_customer_orders(
        &self,
        window: TimeWindow,
        customer_id: i64,
    ) -> Result<RecordStream<Order>> {
        let pages = OrderPages::new(Arc::clone(&self.client), Some(customer_id));
        self.open::<Order>(Arc::new(pages), window).await
    }

    /// Stop token renewal and cancel every open stream.
    pub fn close(&self) {
        self.cancel.cancel();
        self.span.in_scope(|| info!("qdm service closed"));
    }

    async fn open<T>(&self, pages: Arc<dyn PageSource<T>>, window: TimeWindow) -> Result<RecordStream<T>>
    where
        T: Send + 'static,
    {
        open_stream(pages, window, self.options, &self.cancel).instrument(self.span.clone()).await
    }
}

impl Drop for QdmService {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[async_trait]
impl RecordSource for QdmService {
    async fn find_orders(&self, window: TimeWindow) -> Result<RecordStream<Order>> {
        let pages = OrderPages::new(Arc::clone(&self.client), None);
        self.open::<Order>(Arc::new(pages), window).await
    }

    async fn find_customers(&self, window: TimeWindow) -> Result<RecordStream<Customer>> {
        self.open::<Customer>(Arc::new(CustomerPages::new(Arc::clone(&self.client))), window).await
    }

    async fn find_customer_groups(&self) -> Result<Vec<CustomerGroup>> {
        self.client.customer_groups().instrument(self.span.clone()).await
    }
}
