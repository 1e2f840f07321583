//! Per-domain politeness delay
//!
//! Tracks when each host was last requested and makes the caller wait until
//! the configured minimum gap has passed. A zero delay disables throttling.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Default)]
pub struct DomainThrottle {
    min_delay: Duration,
    last_request: HashMap<String, Instant>,
}

impl DomainThrottle {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: HashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        !self.min_delay.is_zero()
    }

    /// Time left before `domain` may be requested again
    ///
    /// # Returns
    ///
    /// * `Some(Duration)` - Must wait this long
    /// * `None` - Can request immediately
    pub fn time_until_next_request(&self, domain: &str, now: Instant) -> Option<Duration> {
        let last = self.last_request.get(domain)?;
        let elapsed = now.saturating_duration_since(*last);
        if elapsed >= self.min_delay {
            None
        } else {
            Some(self.min_delay - elapsed)
        }
    }

    /// Records a request made to `domain` at `now`
    pub fn record_request(&mut self, domain: &str, now: Instant) {
        self.last_request.insert(domain.to_string(), now);
    }

    /// Sleeps until `domain` may be requested, then records the request
    pub async fn wait_for(&mut self, domain: &str) {
        if !self.is_enabled() {
            return;
        }

        if let Some(wait) = self.time_until_next_request(domain, Instant::now()) {
            tracing::debug!("Politeness delay of {}ms for {}", wait.as_millis(), domain);
            tokio::time::sleep(wait).await;
        }

        self.record_request(domain, Instant::now());
    }
}
