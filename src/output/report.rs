//! Final crawl report and its terminal rendering

use crate::output::stats::CrawlStatistics;
use crate::state::JobState;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one crawl job
#[derive(Debug, Clone, Serialize)]
pub struct CrawlReport {
    /// Normalized seed URL
    pub seed_url: String,

    /// Terminal state the job reached
    pub state: JobState,

    pub statistics: CrawlStatistics,

    /// Entries skipped by the domain policy
    pub skipped_by_policy: u64,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl CrawlReport {
    /// Wall-clock duration of the job in milliseconds
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Prints a report to stdout in a formatted manner
pub fn print_report(report: &CrawlReport) {
    let stats = &report.statistics;

    println!("=== Crawl Report ===\n");

    println!("Seed: {}", report.seed_url);
    println!("State: {}", report.state);
    println!("Duration: {:.1}s", report.duration_ms() as f64 / 1000.0);
    println!();

    println!("Overview:");
    println!("  Pages attempted: {}", stats.total_urls);
    println!("  Errors: {}", stats.total_errors);
    println!("  Skipped by policy: {}", report.skipped_by_policy);
    if let Some(avg) = stats.average_response_ms() {
        println!("  Average response: {}ms", avg);
    }
    println!();

    if !stats.status_counts.is_empty() {
        println!("Status Codes:");
        for (status, count) in &stats.status_counts {
            println!("  {}: {}", status, count);
        }
        println!();
    }

    if !stats.domain_counts.is_empty() {
        println!("Domains ({}):", stats.domain_counts.len());
        let mut domains: Vec<_> = stats.domain_counts.iter().collect();
        domains.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
        for (domain, count) in domains {
            println!("  - {}: {}", domain, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} pages)",
        stats.success_rate(),
        stats.total_urls - stats.total_errors,
        stats.total_urls
    );
}
