//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with optional retry
//! - HTML parsing and link extraction
//! - The breadth-first frontier and per-domain politeness
//! - Per-job coordination and single-job admission

mod coordinator;
mod engine;
mod fetcher;
mod frontier;
mod job;
mod parser;
mod throttle;

pub use coordinator::{Coordinator, Step};
pub use engine::{CrawlEngine, JobHandle};
pub use fetcher::{build_http_client, FetchError, FetchedPage, Fetcher};
pub use frontier::{Frontier, FrontierEntry};
pub use job::{CrawlJob, StartCrawlRequest};
pub use parser::{extract, ExtractedPage};
pub use throttle::DomainThrottle;

use crate::config::Config;
use crate::output::CrawlReport;
use crate::Result;

/// Runs a complete crawl in the foreground
///
/// Convenience for callers that neither subscribe to live updates nor
/// cancel. It will:
/// 1. Validate the request against the configuration
/// 2. Build an engine and start the job
/// 3. Wait for the job to reach a terminal state
///
/// # Returns
///
/// * `Ok(CrawlReport)` - The job completed
/// * `Err(RippleError)` - The request was invalid or the engine faulted
pub async fn crawl(config: Config, request: StartCrawlRequest) -> Result<CrawlReport> {
    let engine = CrawlEngine::new(config)?;
    engine.start(request)?.wait().await
}
