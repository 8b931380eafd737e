//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made against a portal, including:
//! - Building cookie-carrying HTTP clients (one per login session)
//! - Gating every request through the shared rate limiter
//! - Retry with exponential backoff for transient failures
//! - Error classification

use crate::config::{Config, HttpConfig, LimitsConfig};
use crate::fetch::limiter::RateLimiter;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Failure of a single logical request (after any retries)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request to {url} timed out")]
    Timeout { url: String, detail: String },

    #[error("connection to {url} failed: {detail}")]
    ConnectionFailed { url: String, detail: String },

    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },

    #[error("access denied (HTTP {status}) at {url}")]
    Unauthorized { url: String, status: u16 },
}

impl FetchError {
    /// Returns true if another attempt may succeed
    ///
    /// | Condition | Retried |
    /// |-----------|---------|
    /// | Timeout | yes |
    /// | Connection failure | yes |
    /// | HTTP 5xx, HTTP 429 | yes |
    /// | HTTP 401/403 | no |
    /// | Other HTTP 4xx | no |
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::ConnectionFailed { .. } => true,
            Self::Http { status, .. } => *status >= 500 || *status == 429,
            Self::Unauthorized { .. } => false,
        }
    }

    /// The URL the failing request targeted
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url, .. }
            | Self::ConnectionFailed { url, .. }
            | Self::Http { url, .. }
            | Self::Unauthorized { url, .. } => url,
        }
    }
}

/// HTTP method of a [`FetchRequest`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// A request to send through the [`Fetcher`]
#[derive(Debug, Clone)]
pub struct FetchRequest {
    method: Method,
    url: Url,
    headers: Vec<(String, String)>,
    form: Vec<(String, String)>,
}

impl FetchRequest {
    /// A GET request
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
            form: Vec::new(),
        }
    }

    /// A POST request with an url-encoded form body
    pub fn post_form(url: Url, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url,
            headers: Vec::new(),
            form,
        }
    }

    /// Adds a request header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn form(&self) -> &[(String, String)] {
        &self.form
    }
}

/// A successful (2xx/3xx) response
#[derive(Debug, Clone)]
pub struct FetchResponse {
    /// URL after redirects
    pub final_url: Url,
    pub status: u16,
    pub body: String,
}

/// Retry schedule for transient failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Additional attempts after the first failure
    pub max_retries: u32,
    pub backoff_base: Duration,
    pub backoff_max: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &LimitsConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            backoff_base: Duration::from_millis(config.backoff_base_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms),
        }
    }

    /// Sleep before retry number `attempt + 1`: `base * 2^attempt`, capped
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.backoff_base
            .saturating_mul(1u32 << attempt.min(20))
            .min(self.backoff_max)
    }
}

/// Builds an HTTP client with its own cookie store
///
/// Redirects are followed (at most 10 hops) so that login handshakes land on
/// the page the portal sends the browser to.
pub fn build_http_client(config: &HttpConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .redirect(Policy::limited(10))
        .cookie_store(true)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sends requests under the shared rate limiter with retry and backoff
#[derive(Debug)]
pub struct Fetcher {
    http: HttpConfig,
    limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    requests_sent: AtomicU64,
}

impl Fetcher {
    pub fn new(http: HttpConfig, limiter: Arc<RateLimiter>, retry: RetryPolicy) -> Self {
        Self {
            http,
            limiter,
            retry,
            requests_sent: AtomicU64::new(0),
        }
    }

    /// Builds a fetcher and its rate limiter from configuration
    pub fn from_config(config: &Config) -> Self {
        let limiter = RateLimiter::new(
            config.limits.max_concurrent as usize,
            Duration::from_millis(config.limits.delay_ms),
        );
        Self::new(
            config.http.clone(),
            Arc::new(limiter),
            RetryPolicy::from_config(&config.limits),
        )
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Number of network calls issued so far (retries included)
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::SeqCst)
    }

    /// Creates a fresh client for one login session
    pub fn session_client(&self) -> Result<Client, reqwest::Error> {
        build_http_client(&self.http)
    }

    /// Sends `request`, retrying transient failures
    ///
    /// # Returns
    ///
    /// * `Ok(FetchResponse)` - 2xx/3xx response with its body
    /// * `Err(FetchError::Unauthorized)` - 401/403, returned without retrying
    /// * `Err(FetchError)` - the last error once the retry budget is spent,
    ///   or any non-retryable error immediately
    pub async fn fetch(
        &self,
        client: &Client,
        request: &FetchRequest,
    ) -> Result<FetchResponse, FetchError> {
        let mut attempt = 0u32;

        loop {
            match self.send_once(client, request).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(
                        url = %request.url,
                        attempt,
                        max_retries = self.retry.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient fetch error, retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(err) => {
                    tracing::debug!(url = %request.url, attempt, error = %err, "Fetch failed");
                    return Err(err);
                }
            }
        }
    }

    /// One network call, holding a rate limiter permit until the body is read
    async fn send_once(
        &self,
        client: &Client,
        request: &FetchRequest,
    ) -> Result<FetchResponse, FetchError> {
        let _permit = self.limiter.acquire().await;
        self.requests_sent.fetch_add(1, Ordering::SeqCst);

        let mut builder = match request.method {
            Method::Get => client.get(request.url.clone()),
            Method::Post => client.post(request.url.clone()).form(&request.form),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        tracing::trace!(method = ?request.method, url = %request.url, "Sending request");
        let response = builder
            .send()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized {
                url: request.url.to_string(),
                status: status.as_u16(),
            });
        }

        if !(status.is_success() || status.is_redirection()) {
            return Err(FetchError::Http {
                url: request.url.to_string(),
                status: status.as_u16(),
            });
        }

        let final_url = response.url().clone();
        let body = response
            .text()
            .await
            .map_err(|e| classify_error(&request.url, e))?;

        Ok(FetchResponse {
            final_url,
            status: status.as_u16(),
            body,
        })
    }
}

/// Maps a transport error onto the fetch error taxonomy
fn classify_error(url: &Url, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            detail: err.to_string(),
        }
    } else {
        FetchError::ConnectionFailed {
            url: url.to_string(),
            detail: err.to_string(),
        }
    }
}
