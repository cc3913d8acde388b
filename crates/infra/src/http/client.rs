use std::time::Duration;

use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use sfsync_domain::{Result, SyncError};
use tracing::debug;

use crate::errors::conversions::{status_error, transport_error};

/// HTTP client with a per-request timeout and domain error mapping.
///
/// Retries are not performed here; callers pace them through a
/// `RetryPolicy` so that chunk- and page-level budgets stay in one place.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    timeout: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Convenience constructor with default configuration.
    ///
    /// # Errors
    /// `Internal` when the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    /// Create a request builder using the underlying reqwest client.
    pub fn request<U>(&self, method: Method, url: U) -> RequestBuilder
    where
        U: reqwest::IntoUrl,
    {
        self.client.request(method, url)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute the request; any status is returned as a response.
    ///
    /// # Errors
    /// `Timeout` or `Network` for transport failures.
    pub async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let request = builder
            .build()
            .map_err(|err| SyncError::Internal(format!("invalid HTTP request: {err}")))?;

        let method = request.method().clone();
        let url = request.url().clone();
        debug!(%method, url = %url.path(), "sending HTTP request");

        match self.client.execute(request).await {
            Ok(response) => {
                debug!(%method, url = %url.path(), status = %response.status(), "received HTTP response");
                Ok(response)
            }
            Err(err) => {
                debug!(%method, url = %url.path(), error = %err, "HTTP request failed");
                Err(transport_error(&err, self.timeout))
            }
        }
    }

    /// Execute the request and decode a JSON success body.
    ///
    /// # Errors
    /// Transport errors, the mapped status error for non-2xx responses, or
    /// `Serialization` for an undecodable body.
    pub async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let body = self.send_checked(builder).await?;
        serde_json::from_str(&body).map_err(|err| SyncError::Serialization(format!("unexpected response body: {err}")))
    }

    /// Execute the request, ignoring the success body.
    ///
    /// # Errors
    /// Same as [`HttpClient::send_json`] minus decoding.
    pub async fn send_empty(&self, builder: RequestBuilder) -> Result<()> {
        self.send_checked(builder).await.map(|_| ())
    }

    async fn send_checked(&self, builder: RequestBuilder) -> Result<String> {
        let response = self.send(builder).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.text().await.map_err(|err| transport_error(&err, self.timeout))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(status_error(status, &headers, &body))
        }
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    timeout: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl Default for HttpClientBuilder {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: Some(concat!("sfsync/", env!("CARGO_PKG_VERSION")).to_string()),
            default_headers: None,
        }
    }
}

impl HttpClientBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn default_headers(mut self, headers: reqwest::header::HeaderMap) -> Self {
        self.default_headers = Some(headers);
        self
    }

    /// # Errors
    /// `Internal` when the underlying client cannot be built.
    pub fn build(self) -> Result<HttpClient> {
        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| SyncError::Internal(format!("failed to build HTTP client: {err}")))?;

        Ok(HttpClient { client, timeout: self.timeout })
    }
}
