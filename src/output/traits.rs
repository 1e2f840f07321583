//! Publisher trait
//!
//! The coordinator calls [`Publisher::publish`] after every recorded page.
//! Transports (broadcast channels, watch channels, sockets, SSE) implement
//! it independently of the crawl logic.

use crate::output::stats::CrawlStatistics;
use std::sync::Arc;

/// Receives statistics snapshots from a running crawl
///
/// Implementations must not block: a slow or disconnected subscriber may
/// lose snapshots but must never stall the crawl loop.
pub trait Publisher: Send + Sync {
    /// Delivers one snapshot to every current subscriber
    fn publish(&self, snapshot: Arc<CrawlStatistics>);
}

impl<P: Publisher + ?Sized> Publisher for Arc<P> {
    fn publish(&self, snapshot: Arc<CrawlStatistics>) {
        (**self).publish(snapshot)
    }
}

/// Publisher that discards every snapshot
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopPublisher;

impl Publisher for NoopPublisher {
    fn publish(&self, _snapshot: Arc<CrawlStatistics>) {}
}
