//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop for a single job:
//! - Driving the job state machine
//! - Draining the breadth-first frontier
//! - Coordinating fetching, parsing, and link extraction
//! - Treating redirect targets as visited
//! - Publishing a statistics snapshot after every attempted page
//! - Honouring cancellation between pages

use crate::crawler::fetcher::{FetchedPage, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::job::CrawlJob;
use crate::crawler::parser::{extract, ExtractedPage};
use crate::crawler::throttle::DomainThrottle;
use crate::output::{CrawlReport, CrawlStatistics, PageResult, Publisher, StatisticsAggregator};
use crate::state::JobState;
use crate::url::{extract_domain, normalize_url, PolicyDecision};
use crate::{Result, RippleError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use url::Url;

/// What a single call to [`Coordinator::step`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// A page was attempted and a snapshot published
    Fetched(Url),
    /// The entry was rejected by the domain policy
    Skipped(Url),
    /// The job reached this terminal state
    Finished(JobState),
}

/// Runs one crawl job to completion
pub struct Coordinator {
    job: CrawlJob,
    frontier: Frontier,
    fetcher: Fetcher,
    aggregator: StatisticsAggregator,
    publisher: Arc<dyn Publisher>,
    throttle: DomainThrottle,
    cancel: CancellationToken,
    state: Arc<watch::Sender<JobState>>,
    skipped_by_policy: u64,
    started_at: Option<DateTime<Utc>>,
    finished_at: Option<DateTime<Utc>>,
}

impl Coordinator {
    /// Creates an idle coordinator with the seed queued at depth 0
    pub fn new(job: CrawlJob, fetcher: Fetcher, publisher: Arc<dyn Publisher>) -> Self {
        let mut frontier = Frontier::new(job.max_depth);
        frontier.enqueue(job.seed_url.clone(), 0);

        let (state, _) = watch::channel(JobState::Idle);

        Self {
            job,
            frontier,
            fetcher,
            aggregator: StatisticsAggregator::new(),
            publisher,
            throttle: DomainThrottle::default(),
            cancel: CancellationToken::new(),
            state: Arc::new(state),
            skipped_by_policy: 0,
            started_at: None,
            finished_at: None,
        }
    }

    /// Uses `token` as the job's cancel signal
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Enforces a minimum gap between requests to the same host
    pub fn with_politeness_delay(mut self, delay: Duration) -> Self {
        self.throttle = DomainThrottle::new(delay);
        self
    }

    pub fn job(&self) -> &CrawlJob {
        &self.job
    }

    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    /// Receiver that observes every state change
    pub fn state_receiver(&self) -> watch::Receiver<JobState> {
        self.state.subscribe()
    }

    /// Shared sender for the job state, used to report a crashed run
    pub(crate) fn state_sender(&self) -> Arc<watch::Sender<JobState>> {
        self.state.clone()
    }

    pub fn frontier(&self) -> &Frontier {
        &self.frontier
    }

    pub fn statistics(&self) -> &CrawlStatistics {
        self.aggregator.current()
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Runs the crawl loop until the job reaches a terminal state
    ///
    /// 1. Transitions Idle -> Running
    /// 2. Steps through the frontier one entry at a time
    /// 3. Returns the final report once Completed or Cancelled
    ///
    /// An internal fault moves the job to Failed and is returned as an error.
    pub async fn run(&mut self) -> Result<CrawlReport> {
        self.start()?;

        loop {
            if let Step::Finished(state) = self.step().await? {
                tracing::info!(
                    "Crawl of {} {}: {} pages, {} errors",
                    self.job.seed_url,
                    state,
                    self.statistics().total_urls,
                    self.statistics().total_errors
                );
                break;
            }
        }

        Ok(self.report())
    }

    /// Transitions Idle -> Running
    pub fn start(&mut self) -> Result<()> {
        self.transition(JobState::Running)?;
        self.started_at = Some(Utc::now());

        tracing::info!(
            "Starting crawl of {} (max depth {})",
            self.job.seed_url,
            self.job.max_depth
        );
        Ok(())
    }

    /// Processes the next frontier entry
    ///
    /// Cancellation is checked before each dequeue, so an in-flight fetch
    /// always finishes and is recorded before the job stops.
    pub async fn step(&mut self) -> Result<Step> {
        let current = self.state();
        if current != JobState::Running {
            return Err(RippleError::EngineFault(format!(
                "cannot step a job in state {}",
                current
            )));
        }

        if self.cancel.is_cancelled() {
            tracing::info!("Crawl of {} cancelled", self.job.seed_url);
            self.finish(JobState::Cancelled)?;
            return Ok(Step::Finished(JobState::Cancelled));
        }

        let Some(entry) = self.frontier.dequeue() else {
            tracing::info!("Frontier is empty, crawl complete");
            self.finish(JobState::Completed)?;
            return Ok(Step::Finished(JobState::Completed));
        };

        if entry.depth > self.job.max_depth {
            let message = format!(
                "dequeued {} at depth {} beyond max depth {}",
                entry.url, entry.depth, self.job.max_depth
            );
            tracing::error!("{}", message);
            self.finish(JobState::Failed)?;
            return Err(RippleError::EngineFault(message));
        }

        match self.job.policy.evaluate(&entry.url) {
            PolicyDecision::Allowed => {}
            decision => {
                tracing::debug!("Skipping {} ({:?})", entry.url, decision);
                self.skipped_by_policy += 1;
                return Ok(Step::Skipped(entry.url));
            }
        }

        let url = entry.url.clone();
        if let Err(e) = self.process_entry(entry).await {
            tracing::error!("Crawl of {} failed: {}", self.job.seed_url, e);
            self.finish(JobState::Failed)?;
            return Err(e);
        }
        Ok(Step::Fetched(url))
    }

    /// Builds a report from the current statistics
    pub fn report(&self) -> CrawlReport {
        let now = Utc::now();
        CrawlReport {
            seed_url: self.job.seed_url.to_string(),
            state: self.state(),
            statistics: self.aggregator.current().clone(),
            skipped_by_policy: self.skipped_by_policy,
            started_at: self.started_at.unwrap_or(now),
            finished_at: self.finished_at.unwrap_or(now),
        }
    }

    /// Fetches one page, records it, publishes, then queues its links
    async fn process_entry(&mut self, entry: FrontierEntry) -> Result<()> {
        let FrontierEntry { url, depth } = entry;
        tracing::debug!("Processing URL: {} (depth {})", url, depth);

        if let Some(domain) = extract_domain(&url) {
            self.throttle.wait_for(&domain).await;
        }

        let started = Instant::now();
        let (result, links) = match self.fetcher.fetch(&url).await {
            Ok(page) => {
                let follow = page.is_success() && depth < self.job.max_depth;
                let is_html = page.is_html();
                let FetchedPage {
                    final_url,
                    status_code,
                    content_type,
                    body,
                    response_time_ms,
                } = page;

                if final_url != url {
                    self.mark_redirect_target(&final_url);
                }

                let extracted = if is_html {
                    tokio::task::spawn_blocking(move || extract(&body, &final_url))
                        .await
                        .map_err(|e| {
                            RippleError::EngineFault(format!("parsing {} aborted: {}", url, e))
                        })?
                } else {
                    tracing::debug!(
                        "Not parsing {} ({})",
                        url,
                        content_type.as_deref().unwrap_or_default()
                    );
                    ExtractedPage {
                        size_bytes: body.len() as u64,
                        ..ExtractedPage::default()
                    }
                };

                let result = PageResult::fetched(
                    &url,
                    depth,
                    status_code,
                    extracted.title,
                    extracted.size_bytes,
                    response_time_ms,
                );
                (result, if follow { extracted.links } else { Vec::new() })
            }
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", url, e);
                let elapsed = started.elapsed().as_millis() as u64;
                (PageResult::failed(&url, depth, e.to_string(), elapsed), Vec::new())
            }
        };

        let snapshot = self.aggregator.record(result);
        self.publisher.publish(snapshot);

        self.enqueue_links(links, depth + 1);
        Ok(())
    }

    fn mark_redirect_target(&mut self, target: &Url) {
        match normalize_url(target.as_str(), None) {
            Ok(target) => {
                tracing::trace!("Redirect target {} marked visited", target);
                self.frontier.mark_visited(target);
            }
            Err(e) => tracing::debug!("Redirect target {} not tracked: {}", target, e),
        }
    }

    fn enqueue_links(&mut self, links: Vec<Url>, depth: u32) {
        let mut queued = 0;
        for link in links {
            if !self.job.policy.is_allowed(&link) {
                tracing::trace!("Not following {}", link);
                continue;
            }
            if self.frontier.enqueue(link, depth) {
                queued += 1;
            }
        }

        if queued > 0 {
            tracing::debug!(
                "Queued {} new URLs at depth {} ({} pending)",
                queued,
                depth,
                self.frontier.len()
            );
        }
    }

    fn finish(&mut self, next: JobState) -> Result<()> {
        self.transition(next)?;
        self.finished_at = Some(Utc::now());
        Ok(())
    }

    fn transition(&mut self, next: JobState) -> Result<()> {
        let current = self.state();
        if !current.can_transition_to(next) {
            return Err(RippleError::InvalidTransition {
                from: current,
                to: next,
            });
        }

        tracing::debug!("Job state {} -> {}", current, next);
        self.state.send_replace(next);
        Ok(())
    }
}
