//! Resource fetching over HTTP
//!
//! The transport timeout and retry loop live here; the engine still races
//! every call against the per-cache network timeout.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Response};
use tidepool_core::ResourceFetcher;
use tidepool_domain::{CacheError, FetchError, ResourceIdentity};
use tracing::debug;
use url::Url;

use crate::errors::IntoFetchError;

/// `ResourceFetcher` over HTTP with retry and timeout support.
///
/// Identities are resolved against a base URL; absolute identities
/// (`https://...`) are fetched as-is. Non-2xx responses become
/// [`FetchError::Status`].
#[derive(Clone)]
pub struct HttpResourceFetcher {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpResourceFetcher {
    /// Start building a fetcher rooted at `base_url`.
    pub fn builder(base_url: impl Into<String>) -> HttpResourceFetcherBuilder {
        HttpResourceFetcherBuilder::new(base_url)
    }

    /// Resolve an identity into the URL to request.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Transport`] if the identity does not form a
    /// valid URL.
    pub fn resolve(&self, identity: &ResourceIdentity) -> Result<Url, FetchError> {
        let raw = identity.as_str();
        let resolved = if raw.starts_with("http://") || raw.starts_with("https://") {
            Url::parse(raw)
        } else {
            self.base_url.join(raw.trim_start_matches('/'))
        };
        resolved.map_err(|err| FetchError::Transport(format!("invalid resource URL '{raw}': {err}")))
    }

    /// Execute a GET with retry semantics.
    ///
    /// Server errors and connection failures are retried with exponential
    /// backoff; the last response or error is returned once attempts run out.
    async fn get_with_retry(&self, url: &Url) -> Result<Response, FetchError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, %url, "sending HTTP request");

            match self.client.get(url.clone()).send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt, %url, %status, "received HTTP response");

                    if status.is_server_error() && attempt < attempts {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Ok(response);
                }
                Err(err) => {
                    debug!(attempt, %url, error = %err, "HTTP request failed");

                    if attempt < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt).await;
                        continue;
                    }
                    return Err(err.into_fetch_error(self.timeout));
                }
            }
        }
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        self.base_backoff.saturating_mul(1u32 << shift)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl ResourceFetcher for HttpResourceFetcher {
    async fn fetch(&self, identity: &ResourceIdentity) -> Result<Vec<u8>, FetchError> {
        let url = self.resolve(identity)?;
        let response = self.get_with_retry(&url).await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status { status: status.as_u16() });
        }

        let body = response.bytes().await.map_err(|err| err.into_fetch_error(self.timeout))?;
        Ok(body.to_vec())
    }
}

impl std::fmt::Debug for HttpResourceFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpResourceFetcher")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HttpResourceFetcher`].
#[derive(Debug)]
pub struct HttpResourceFetcherBuilder {
    base_url: String,
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
    default_headers: Option<reqwest::header::HeaderMap>,
}

impl HttpResourceFetcherBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(30),
            max_attempts: 1,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
            default_headers: None,
        }
    }

    /// Transport-level timeout; the engine applies its own per-cache
    /// deadline on top.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries).
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
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
    ///
    /// Returns [`CacheError::Config`] if the base URL does not parse or the
    /// HTTP client cannot be built.
    pub fn build(self) -> Result<HttpResourceFetcher, CacheError> {
        let mut base_url = Url::parse(&self.base_url)
            .map_err(|err| CacheError::config("http", format!("invalid base URL: {err}")))?;
        // `Url::join` drops the last segment unless the base ends with '/'
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut builder = ReqwestClient::builder().timeout(self.timeout).no_proxy();

        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }

        if let Some(headers) = self.default_headers {
            builder = builder.default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|err| CacheError::config("http", format!("failed to build client: {err}")))?;

        Ok(HttpResourceFetcher {
            client,
            base_url,
            timeout: self.timeout,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}
