//! Wire format of live updates
//!
//! One [`LiveUpdate`] is derived from every published statistics snapshot.
//! Status codes become string keys so the payload is plain JSON.

use crate::output::stats::CrawlStatistics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One row of the `results` list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRow {
    pub title: String,
    pub url: String,
    pub status: Option<u16>,
    pub size: u64,
}

/// JSON payload pushed to live subscribers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveUpdate {
    pub total_urls: u64,
    pub errors: u64,
    pub status_counts: BTreeMap<String, u64>,
    pub domain_counts: BTreeMap<String, u64>,
    pub results: Vec<ResultRow>,
}

impl LiveUpdate {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl From<&CrawlStatistics> for LiveUpdate {
    fn from(stats: &CrawlStatistics) -> Self {
        Self {
            total_urls: stats.total_urls,
            errors: stats.total_errors,
            status_counts: stats
                .status_counts
                .iter()
                .map(|(key, count)| (key.to_string(), *count))
                .collect(),
            domain_counts: stats.domain_counts.clone(),
            results: stats
                .records
                .iter()
                .map(|record| ResultRow {
                    title: record.title.clone(),
                    url: record.url.clone(),
                    status: record.status,
                    size: record.size_bytes,
                })
                .collect(),
        }
    }
}
