//! Crawl engine: single-job admission and job handles
//!
//! The engine owns the shared HTTP client and the live-update publisher. It
//! admits at most one job at a time; a start request that arrives while a
//! job is running is rejected with [`RippleError::Busy`] and never queued.

use crate::config::{validate, Config};
use crate::crawler::coordinator::Coordinator;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::job::{CrawlJob, StartCrawlRequest};
use crate::output::{BroadcastPublisher, CrawlReport, CrawlStatistics, Publisher};
use crate::state::JobState;
use crate::{Result, RippleError};
use reqwest::Client;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Entry point for starting crawls
pub struct CrawlEngine {
    config: Arc<Config>,
    client: Client,
    publisher: Arc<dyn Publisher>,
    broadcast: Option<BroadcastPublisher>,
    running: Arc<AtomicBool>,
}

impl CrawlEngine {
    /// Creates an engine that broadcasts snapshots to its subscribers
    pub fn new(config: Config) -> Result<Self> {
        let broadcast = BroadcastPublisher::new(config.publisher.channel_capacity.max(1));
        let mut engine = Self::with_publisher(config, Arc::new(broadcast.clone()))?;
        engine.broadcast = Some(broadcast);
        Ok(engine)
    }

    /// Creates an engine that hands snapshots to a custom publisher
    pub fn with_publisher(config: Config, publisher: Arc<dyn Publisher>) -> Result<Self> {
        validate(&config)?;
        let client = build_http_client(&config.crawler, &config.user_agent)?;

        Ok(Self {
            config: Arc::new(config),
            client,
            publisher,
            broadcast: None,
            running: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Subscribes to live snapshots
    ///
    /// Returns None when the engine was built with a custom publisher.
    /// Subscribers only receive snapshots published after they subscribe.
    pub fn subscribe(&self) -> Option<broadcast::Receiver<Arc<CrawlStatistics>>> {
        self.broadcast.as_ref().map(BroadcastPublisher::subscribe)
    }

    /// Returns true while a job holds the run slot
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Validates a start request and starts it
    pub fn start(&self, request: StartCrawlRequest) -> Result<JobHandle> {
        let job = request.into_job(&self.config.crawler)?;
        self.try_start(job)
    }

    /// Starts a job on the current tokio runtime
    ///
    /// # Errors
    ///
    /// * `RippleError::Busy` - Another job is still running
    pub fn try_start(&self, job: CrawlJob) -> Result<JobHandle> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            tracing::warn!("Rejected crawl of {}: a job is already running", job.seed_url);
            return Err(RippleError::Busy);
        }
        let slot = RunSlot(self.running.clone());

        let cancel = CancellationToken::new();
        let fetcher = Fetcher::new(self.client.clone(), &self.config.crawler);
        let mut coordinator = Coordinator::new(job, fetcher, self.publisher.clone())
            .with_cancellation(cancel.clone())
            .with_politeness_delay(Duration::from_millis(
                self.config.crawler.politeness_delay_ms,
            ));
        let state = coordinator.state_receiver();
        let state_tx = coordinator.state_sender();
        let seed = coordinator.job().seed_url.clone();

        let run = tokio::spawn(async move { coordinator.run().await });
        let task = tokio::spawn(async move {
            let _slot = slot;
            match run.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!("Crawl of {} crashed: {}", seed, e);
                    state_tx.send_replace(JobState::Failed);
                    Err(RippleError::EngineFault(format!("crawl task aborted: {}", e)))
                }
            }
        });

        Ok(JobHandle {
            cancel,
            state,
            task,
        })
    }
}

/// Releases the run slot when the job's task ends, however it ends
struct RunSlot(Arc<AtomicBool>);

impl Drop for RunSlot {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Handle to a running crawl job
pub struct JobHandle {
    cancel: CancellationToken,
    state: watch::Receiver<JobState>,
    task: JoinHandle<Result<CrawlReport>>,
}

impl JobHandle {
    /// Requests cancellation; the job stops before its next fetch
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> JobState {
        *self.state.borrow()
    }

    pub fn state_receiver(&self) -> watch::Receiver<JobState> {
        self.state.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits for the job and returns its report
    ///
    /// A job whose task panicked ends in Failed and yields EngineFault.
    pub async fn wait(self) -> Result<CrawlReport> {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => Err(RippleError::EngineFault(format!("crawl task aborted: {}", e))),
        }
    }
}
