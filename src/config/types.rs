use serde::Deserialize;

/// Main configuration structure for Ripple-Watch
///
/// Every section is optional in the TOML file; missing sections fall back
/// to their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CrawlerConfig {
    /// Depth used when a crawl request does not name one
    pub default_max_depth: u32,

    /// Upper bound on a single request, connect through body read (seconds)
    pub request_timeout_secs: u64,

    /// Upper bound on establishing a connection (seconds)
    pub connect_timeout_secs: u64,

    /// Maximum redirect hops followed per request
    pub max_redirects: usize,

    /// Response bodies are truncated to this many bytes
    pub max_body_bytes: usize,

    /// Extra attempts after a timeout or connection failure
    pub retry_attempts: u32,

    /// Pause between retry attempts (milliseconds)
    pub retry_delay_ms: u64,

    /// Minimum time between two requests to the same host (milliseconds)
    pub politeness_delay_ms: u64,

    /// Block patterns applied when a request does not supply its own
    pub default_blacklist: Vec<String>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            default_max_depth: 2,
            request_timeout_secs: 10,
            connect_timeout_secs: 5,
            max_redirects: 10,
            max_body_bytes: 5 * 1024 * 1024,
            retry_attempts: 0,
            retry_delay_ms: 500,
            politeness_delay_ms: 0,
            default_blacklist: [".jpg", ".png", ".css", ".js", ".pdf"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    pub crawler_name: String,

    /// Version of the crawler
    pub crawler_version: String,

    /// URL with information about the crawler
    pub contact_url: String,

    /// Email address for crawler-related contact
    pub contact_email: String,
}

impl UserAgentConfig {
    /// Formats the header value: `Name/Version (+ContactURL; ContactEmail)`
    pub fn header_value(&self) -> String {
        format!(
            "{}/{} (+{}; {})",
            self.crawler_name, self.crawler_version, self.contact_url, self.contact_email
        )
    }
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "RippleWatch".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: "https://example.com/about".to_string(),
            contact_email: "admin@example.com".to_string(),
        }
    }
}

/// Live update channel configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct PublisherConfig {
    /// Per-subscriber buffer of snapshots before the oldest are dropped
    pub channel_capacity: usize,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 256,
        }
    }
}
