use std::time::{Duration, Instant};

use qdmsync_domain::constants::DEFAULT_REQUEST_TIMEOUT;
use qdmsync_domain::QdmSyncError;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use tracing::{debug, warn};

use crate::errors::InfraError;

/// HTTP transport bound to one API root.
///
/// Paths passed to [`get`](Self::get) and [`post`](Self::post) are appended
/// to the root. Every request is attempted once: a failed page request ends
/// its walk rather than being replayed here.
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: ReqwestClient,
    api_url: String,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder(api_url: impl Into<String>) -> HttpClientBuilder {
        HttpClientBuilder::new(api_url)
    }

    /// Client with the default timeout and no user agent.
    pub fn new(api_url: impl Into<String>) -> Result<Self, QdmSyncError> {
        Self::builder(api_url).build()
    }

    /// Root every request path is resolved against.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.client.request(method, self.url(path))
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_url, path.trim_start_matches('/'))
    }

    /// Execute a request.
    ///
    /// Any HTTP status is returned as a response; decoding the envelope is up
    /// to the caller. Only failures to obtain a response are errors.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response, QdmSyncError> {
        let request = builder.build().map_err(into_domain)?;
        let method = request.method().clone();
        let path = request.url().path().to_string();

        let started = Instant::now();
        match self.client.execute(request).await {
            Ok(response) => {
                let status = response.status();
                let elapsed_ms = started.elapsed().as_millis();
                if status.is_success() {
                    debug!(%method, %path, %status, elapsed_ms, "http response");
                } else {
                    warn!(%method, %path, %status, elapsed_ms, "http error status");
                }
                Ok(response)
            }
            Err(err) => {
                warn!(%method, %path, error = %err, "http request failed");
                Err(into_domain(err))
            }
        }
    }
}

fn into_domain(err: reqwest::Error) -> QdmSyncError {
    InfraError::from(err).into()
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    api_url: String,
    timeout: Duration,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    fn new(api_url: impl Into<String>) -> Self {
        Self { api_url: api_url.into(), timeout: DEFAULT_REQUEST_TIMEOUT, user_agent: None }
    }

    /// Whole-request timeout, connection included.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, QdmSyncError> {
        let api_url = self.api_url.trim_end_matches('/').to_string();
        if api_url.is_empty() {
            return Err(QdmSyncError::Config("api url must not be empty".into()));
        }

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let client = builder.build().map_err(into_domain)?;

        Ok(HttpClient { client, api_url })
    }
}
