//! Output module for crawl statistics and live updates
//!
//! This module handles:
//! - Aggregating page results into running statistics
//! - Publishing snapshots to live subscribers
//! - The JSON wire format of live updates
//! - The final crawl report

mod broadcast;
mod message;
mod report;
pub mod stats;
mod traits;

pub use broadcast::{BroadcastPublisher, LatestPublisher};
pub use message::{LiveUpdate, ResultRow};
pub use report::{print_report, CrawlReport};
pub use stats::{CrawlStatistics, PageResult, StatisticsAggregator, StatusKey};
pub use traits::{NoopPublisher, Publisher};
