//! Crawl job definition and the inbound start request

use crate::config::{validate_block_pattern, CrawlerConfig};
use crate::url::{normalize_url, DomainPolicy};
use crate::UrlError;
use serde::Deserialize;
use url::Url;

/// An immutable description of one crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlJob {
    /// Normalized seed URL
    pub seed_url: Url,

    /// Maximum link hops from the seed; 0 fetches only the seed
    pub max_depth: u32,

    /// Allow/block rules applied to every URL, including the seed
    pub policy: DomainPolicy,
}

impl CrawlJob {
    /// Creates a job, normalizing the seed URL
    ///
    /// # Examples
    ///
    /// ```
    /// use ripple_watch::CrawlJob;
    ///
    /// let job = CrawlJob::new("https://Example.com", 1, &["example.com"], &[".pdf"]).unwrap();
    /// assert_eq!(job.seed_url.as_str(), "https://example.com/");
    /// ```
    pub fn new<A, B>(
        seed_url: &str,
        max_depth: u32,
        allowed_domains: &[A],
        blocked: &[B],
    ) -> Result<Self, UrlError>
    where
        A: AsRef<str>,
        B: AsRef<str>,
    {
        Ok(Self {
            seed_url: normalize_url(seed_url, None)?,
            max_depth,
            policy: DomainPolicy::new(allowed_domains, blocked),
        })
    }

    pub fn allowed_domains(&self) -> &[String] {
        self.policy.allowed()
    }

    pub fn blocked_domains(&self) -> &[String] {
        self.policy.blocked()
    }
}

/// Start-crawl request as received from a client
///
/// ```json
/// {"url": "https://example.com", "max_depth": 1, "domains": ["example.com"], "blacklisted": [".pdf"]}
/// ```
///
/// Omitted fields take defaults: `max_depth` from the configuration,
/// `domains` empty (all domains allowed), `blacklisted` the configured
/// default block-list. An explicit empty `blacklisted` list blocks nothing.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct StartCrawlRequest {
    pub url: String,

    #[serde(default)]
    pub max_depth: Option<u32>,

    #[serde(default)]
    pub domains: Vec<String>,

    #[serde(default, alias = "blacklist")]
    pub blacklisted: Option<Vec<String>>,
}

impl StartCrawlRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_depth: None,
            domains: Vec::new(),
            blacklisted: None,
        }
    }

    /// Parses a request from its JSON form
    pub fn from_json(json: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Validates the request and turns it into a job
    ///
    /// # Errors
    ///
    /// * `RippleError::InvalidUrl` - The seed is not an absolute http(s) URL
    /// * `RippleError::Config` - A block pattern is malformed
    pub fn into_job(self, config: &CrawlerConfig) -> crate::Result<CrawlJob> {
        let blocked = self
            .blacklisted
            .unwrap_or_else(|| config.default_blacklist.clone());

        for pattern in blocked.iter().filter(|p| !p.trim().is_empty()) {
            validate_block_pattern(pattern)?;
        }

        let max_depth = self.max_depth.unwrap_or(config.default_max_depth);

        Ok(CrawlJob::new(&self.url, max_depth, &self.domains, &blocked)?)
    }
}
