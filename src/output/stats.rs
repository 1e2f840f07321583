//! Running crawl statistics
//!
//! The aggregator is owned by the coordinator of one job. Every call to
//! [`StatisticsAggregator::record`] applies one page result and hands back
//! a complete, immutable snapshot for publishing.

use crate::url::extract_domain;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Bucket key for per-status counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum StatusKey {
    /// An HTTP response with this status code
    Code(u16),
    /// The fetch produced no HTTP response
    Error,
}

impl From<Option<u16>> for StatusKey {
    fn from(status: Option<u16>) -> Self {
        status.map_or(Self::Error, Self::Code)
    }
}

impl fmt::Display for StatusKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Code(code) => write!(f, "{}", code),
            Self::Error => f.write_str("error"),
        }
    }
}

impl Serialize for StatusKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of one fetch attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageResult {
    /// The normalized URL that was requested
    pub url: String,

    /// Lowercase host of `url`
    pub domain: String,

    /// Link hops from the seed
    pub depth: u32,

    /// HTTP status, or None when no response was received
    pub status: Option<u16>,

    /// Text of the first `<title>` element, possibly empty
    pub title: String,

    /// Body length in bytes
    pub size_bytes: u64,

    pub response_time_ms: u64,

    /// Failure reason when `status` is None
    pub error: Option<String>,
}

impl PageResult {
    /// Creates a result for a request that produced an HTTP response
    pub fn fetched(
        url: &Url,
        depth: u32,
        status: u16,
        title: String,
        size_bytes: u64,
        response_time_ms: u64,
    ) -> Self {
        Self {
            url: url.to_string(),
            domain: extract_domain(url).unwrap_or_default(),
            depth,
            status: Some(status),
            title,
            size_bytes,
            response_time_ms,
            error: None,
        }
    }

    /// Creates a result for a request that failed before any response
    pub fn failed(url: &Url, depth: u32, error: impl Into<String>, response_time_ms: u64) -> Self {
        Self {
            url: url.to_string(),
            domain: extract_domain(url).unwrap_or_default(),
            depth,
            status: None,
            title: String::new(),
            size_bytes: 0,
            response_time_ms,
            error: Some(error.into()),
        }
    }

    /// Returns true if this result counts towards the error total
    ///
    /// Missing statuses and HTTP 4xx/5xx are errors.
    pub fn is_error(&self) -> bool {
        self.status.map_or(true, |code| code >= 400)
    }

    pub fn status_key(&self) -> StatusKey {
        StatusKey::from(self.status)
    }
}

/// Aggregated counters and ordered page records of one crawl job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlStatistics {
    /// Number of page results recorded
    pub total_urls: u64,

    /// Number of results without a status or with status >= 400
    pub total_errors: u64,

    pub status_counts: BTreeMap<StatusKey, u64>,

    pub domain_counts: BTreeMap<String, u64>,

    /// Page results in discovery order, shared between snapshots
    pub records: Vec<Arc<PageResult>>,
}

impl CrawlStatistics {
    /// Returns the share of successful results as a percentage
    pub fn success_rate(&self) -> f64 {
        if self.total_urls == 0 {
            return 0.0;
        }
        ((self.total_urls - self.total_errors) as f64 / self.total_urls as f64) * 100.0
    }

    /// Mean response time over all results, in milliseconds
    pub fn average_response_ms(&self) -> Option<u64> {
        if self.records.is_empty() {
            return None;
        }
        let total: u64 = self.records.iter().map(|r| r.response_time_ms).sum();
        Some(total / self.records.len() as u64)
    }
}

/// Applies page results to a [`CrawlStatistics`] and produces snapshots
#[derive(Debug, Default)]
pub struct StatisticsAggregator {
    stats: CrawlStatistics,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one page result and returns the updated snapshot
    ///
    /// The snapshot is taken after every counter and the record list have
    /// been updated, so subscribers never observe a half-applied result.
    /// Snapshots share the page records, so taking one copies pointers only.
    pub fn record(&mut self, result: PageResult) -> Arc<CrawlStatistics> {
        self.stats.total_urls += 1;
        if result.is_error() {
            self.stats.total_errors += 1;
        }
        *self
            .stats
            .status_counts
            .entry(result.status_key())
            .or_insert(0) += 1;
        *self
            .stats
            .domain_counts
            .entry(result.domain.clone())
            .or_insert(0) += 1;
        self.stats.records.push(Arc::new(result));

        Arc::new(self.stats.clone())
    }

    /// Read-only view of the current statistics
    pub fn current(&self) -> &CrawlStatistics {
        &self.stats
    }

    pub fn into_inner(self) -> CrawlStatistics {
        self.stats
    }
}
