//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests bounded by a per-request timeout and a body size cap
//! - Optional retry of transient failures
//! - Error classification

use crate::config::{CrawlerConfig, UserAgentConfig};
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use thiserror::Error;
use url::Url;

/// Why a fetch produced no usable response
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connection { url: String, message: String },

    #[error("HTTP error for {url}: {message}")]
    Http { url: String, message: String },
}

impl FetchError {
    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Connection { .. } => "connection",
            Self::Http { .. } => "http",
        }
    }

    /// Returns true for failures that may succeed on a second attempt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Connection { .. })
    }

    fn from_reqwest(url: &Url, error: reqwest::Error) -> Self {
        let url = url.to_string();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if error.is_connect() {
            Self::Connection {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Http {
                url,
                message: error.to_string(),
            }
        }
    }
}

/// A response that was received in full
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects; relative links resolve against it
    pub final_url: Url,

    pub status_code: u16,

    /// Value of the `content-type` header, if any
    pub content_type: Option<String>,

    /// Body, truncated to the configured cap
    pub body: Vec<u8>,

    pub response_time_ms: u64,
}

impl FetchedPage {
    /// Returns true for 2xx responses
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Returns true when the body should be parsed as HTML
    ///
    /// A missing `content-type` header is treated as HTML.
    pub fn is_html(&self) -> bool {
        match &self.content_type {
            None => true,
            Some(value) => {
                let mime = value
                    .split(';')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_ascii_lowercase();
                mime == "text/html" || mime == "application/xhtml+xml"
            }
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use ripple_watch::config::Config;
/// use ripple_watch::crawler::build_http_client;
///
/// let config = Config::default();
/// let client = build_http_client(&config.crawler, &config.user_agent).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(Duration::from_secs(crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(crawler.connect_timeout_secs))
        .redirect(Policy::limited(crawler.max_redirects))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Performs single-URL fetches for a crawl job
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    timeout: Duration,
    max_body_bytes: usize,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            timeout: Duration::from_secs(config.request_timeout_secs),
            max_body_bytes: config.max_body_bytes,
            retry_attempts: config.retry_attempts,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
        }
    }

    /// Overrides the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Fetches a URL with the configured timeout
    pub async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        self.fetch_with_timeout(url, self.timeout).await
    }

    /// Fetches a URL, giving each attempt at most `timeout`
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | Any HTTP response (incl. 4xx/5xx) | Returned as-is |
    /// | Timeout | Retry up to `retry-attempts` times |
    /// | Connection failure | Retry up to `retry-attempts` times |
    /// | Other transport error | Immediate failure |
    ///
    /// With the default configuration nothing is retried.
    pub async fn fetch_with_timeout(
        &self,
        url: &Url,
        timeout: Duration,
    ) -> Result<FetchedPage, FetchError> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(url, timeout).await {
                Err(e) if e.is_transient() && attempt < self.retry_attempts => {
                    attempt += 1;
                    tracing::warn!(
                        "Fetch of {} failed ({}), retry {}/{}",
                        url,
                        e.reason(),
                        attempt,
                        self.retry_attempts
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                outcome => return outcome,
            }
        }
    }

    async fn fetch_once(&self, url: &Url, timeout: Duration) -> Result<FetchedPage, FetchError> {
        let started = Instant::now();

        let mut response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?;

        let status_code = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut body = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::from_reqwest(url, e))?
        {
            let room = self.max_body_bytes.saturating_sub(body.len());
            if chunk.len() > room {
                body.extend_from_slice(&chunk[..room]);
                tracing::debug!(
                    "Truncated body of {} at {} bytes",
                    url,
                    self.max_body_bytes
                );
                break;
            }
            body.extend_from_slice(&chunk);
        }

        Ok(FetchedPage {
            final_url,
            status_code,
            content_type,
            body,
            response_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
