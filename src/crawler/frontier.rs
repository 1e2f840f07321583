//! Breadth-first frontier with a visited set
//!
//! The frontier is a FIFO queue of URLs annotated with their depth. A URL
//! enters the visited set the moment it is enqueued, so each URL is queued
//! (and therefore fetched) at most once per job. Entries deeper than the
//! job's maximum depth are refused at the door.

use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// Normalized absolute URL
    pub url: Url,

    /// Link hops from the seed
    pub depth: u32,
}

/// FIFO queue of pending URLs plus the set of URLs already seen
#[derive(Debug)]
pub struct Frontier {
    max_depth: u32,
    visited: HashSet<Url>,
    queue: VecDeque<FrontierEntry>,
}

impl Frontier {
    /// Creates an empty frontier that refuses entries deeper than `max_depth`
    pub fn new(max_depth: u32) -> Self {
        Self {
            max_depth,
            visited: HashSet::new(),
            queue: VecDeque::new(),
        }
    }

    /// Queues a URL unless it was seen before or is too deep
    ///
    /// # Returns
    ///
    /// * `true` - The URL was added to the visited set and the queue
    /// * `false` - The call was a no-op
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth || self.visited.contains(&url) {
            return false;
        }

        self.visited.insert(url.clone());
        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    /// Records a URL as seen without queueing it
    ///
    /// Used for redirect targets, which are fetched under another URL.
    /// Returns false if the URL was already known.
    pub fn mark_visited(&mut self, url: Url) -> bool {
        self.visited.insert(url)
    }

    /// Pops the oldest pending entry
    pub fn dequeue(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Number of entries waiting to be fetched
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Number of distinct URLs ever enqueued
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    pub fn has_visited(&self, url: &Url) -> bool {
        self.visited.contains(url)
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Pending entries in dequeue order
    pub fn pending(&self) -> impl Iterator<Item = &FrontierEntry> {
        self.queue.iter()
    }
}
