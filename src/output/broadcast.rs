//! Channel-backed publishers
//!
//! - [`BroadcastPublisher`]: every subscriber gets every snapshot, up to a
//!   bounded backlog; a lagging subscriber loses the oldest ones.
//! - [`LatestPublisher`]: subscribers only ever see the most recent snapshot.

use crate::output::stats::CrawlStatistics;
use crate::output::traits::Publisher;
use std::sync::Arc;
use tokio::sync::{broadcast, watch};

/// Fan-out publisher over a tokio broadcast channel
///
/// Cloneable. Subscribers that join late only receive snapshots published
/// after they subscribed.
#[derive(Debug, Clone)]
pub struct BroadcastPublisher {
    sender: broadcast::Sender<Arc<CrawlStatistics>>,
    capacity: usize,
}

impl BroadcastPublisher {
    /// Creates a publisher with the given per-subscriber backlog
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero; configuration validation rejects that.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<CrawlStatistics>> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Publisher for BroadcastPublisher {
    fn publish(&self, snapshot: Arc<CrawlStatistics>) {
        // Err only means nobody is listening
        if self.sender.send(snapshot).is_err() {
            tracing::trace!("No live subscribers, snapshot dropped");
        }
    }
}

/// Publisher that retains only the latest snapshot
#[derive(Debug, Clone)]
pub struct LatestPublisher {
    sender: Arc<watch::Sender<Option<Arc<CrawlStatistics>>>>,
}

impl LatestPublisher {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<CrawlStatistics>>> {
        self.sender.subscribe()
    }

    /// The most recently published snapshot, if any
    pub fn latest(&self) -> Option<Arc<CrawlStatistics>> {
        self.sender.borrow().clone()
    }
}

impl Default for LatestPublisher {
    fn default() -> Self {
        Self::new()
    }
}

impl Publisher for LatestPublisher {
    fn publish(&self, snapshot: Arc<CrawlStatistics>) {
        self.sender.send_replace(Some(snapshot));
    }
}
