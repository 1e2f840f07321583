//! Ripple-Watch main entry point
//!
//! This is the command-line interface for the Ripple-Watch crawl engine.

use anyhow::Context;
use clap::Parser;
use ripple_watch::config::{load_config_with_hash, Config};
use ripple_watch::output::print_report;
use ripple_watch::{CrawlEngine, CrawlStatistics, LiveUpdate, StartCrawlRequest};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::sync::broadcast::Receiver;
use tracing_subscriber::EnvFilter;

/// Ripple-Watch: a live-reporting breadth-first crawler
///
/// Crawls outward from a seed URL up to a maximum depth and reports
/// statistics after every page it attempts. Press Ctrl-C to stop early;
/// the pages crawled so far are still reported.
#[derive(Parser, Debug)]
#[command(name = "ripple-watch")]
#[command(version)]
#[command(about = "A live-reporting breadth-first crawler", long_about = None)]
struct Cli {
    /// Seed URL to start crawling from
    #[arg(value_name = "URL")]
    url: String,

    /// Maximum link hops from the seed (defaults to the configured value)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Only follow links on this domain or its subdomains (repeatable)
    #[arg(long = "domain", value_name = "DOMAIN")]
    domains: Vec<String>,

    /// Skip URLs matching this pattern, e.g. ".pdf" (repeatable; replaces the default list)
    #[arg(long = "blacklist", value_name = "PATTERN")]
    blacklist: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print each live update and the final report as JSON lines
    #[arg(long)]
    json: bool,

    /// Validate the job and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn request(&self) -> StartCrawlRequest {
        StartCrawlRequest {
            url: self.url.clone(),
            max_depth: self.max_depth,
            domains: self.domains.clone(),
            blacklisted: (!self.blacklist.is_empty()).then(|| self.blacklist.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if cli.dry_run {
        handle_dry_run(&config, cli.request())
    } else {
        handle_crawl(config, cli.request(), cli.json).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Logs go to stderr so that `--json` output on stdout stays parseable.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("ripple_watch=info,warn"),
            1 => EnvFilter::new("ripple_watch=debug,info"),
            2 => EnvFilter::new("ripple_watch=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: validates the job and shows its settings
fn handle_dry_run(config: &Config, request: StartCrawlRequest) -> anyhow::Result<()> {
    let job = request
        .into_job(&config.crawler)
        .context("Invalid crawl request")?;

    println!("=== Ripple-Watch Dry Run ===\n");

    println!("Job:");
    println!("  Seed: {}", job.seed_url);
    println!("  Max depth: {}", job.max_depth);

    println!("\nAllowed Domains ({}):", job.allowed_domains().len());
    if job.allowed_domains().is_empty() {
        println!("  (any)");
    }
    for domain in job.allowed_domains() {
        println!("  - {}", domain);
    }

    println!("\nBlocked Patterns ({}):", job.blocked_domains().len());
    for pattern in job.blocked_domains() {
        println!("  - {}", pattern);
    }

    println!("\nCrawler Configuration:");
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Retry attempts: {}", config.crawler.retry_attempts);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  User agent: {}", config.user_agent.header_value());

    println!("\n✓ Configuration is valid");
    if !job.policy.is_allowed(&job.seed_url) {
        println!("! The seed URL itself is excluded by the domain policy");
    }

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, request: StartCrawlRequest, json: bool) -> anyhow::Result<()> {
    let engine = CrawlEngine::new(config)?;
    let mut updates = engine
        .subscribe()
        .context("Engine has no live update channel")?;

    let handle = engine.start(request).context("Failed to start crawl")?;

    let token = handle.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping after the current page");
            token.cancel();
        }
    });

    let wait = handle.wait();
    tokio::pin!(wait);

    let outcome = loop {
        tokio::select! {
            biased;
            update = updates.recv() => match update {
                Ok(snapshot) => emit_update(&snapshot, json)?,
                Err(RecvError::Lagged(missed)) => {
                    tracing::warn!("Output fell behind, skipped {} updates", missed);
                }
                Err(RecvError::Closed) => {}
            },
            outcome = &mut wait => break outcome,
        }
    };
    drain_updates(&mut updates, json)?;

    let report = match outcome {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            return Err(e.into());
        }
    };

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!();
        print_report(&report);
    }

    Ok(())
}

fn drain_updates(updates: &mut Receiver<Arc<CrawlStatistics>>, json: bool) -> anyhow::Result<()> {
    loop {
        match updates.try_recv() {
            Ok(snapshot) => emit_update(&snapshot, json)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
        }
    }
}

fn emit_update(snapshot: &CrawlStatistics, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", LiveUpdate::from(snapshot).to_json()?);
    } else if let Some(last) = snapshot.records.last() {
        let status = last
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "error".to_string());
        tracing::info!(
            "[{}] {} (depth {}) - {} pages, {} errors",
            status,
            last.url,
            last.depth,
            snapshot.total_urls,
            snapshot.total_errors
        );
    }
    Ok(())
}
