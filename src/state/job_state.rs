//! Lifecycle states of a crawl job
//!
//! ```text
//! Idle -> Running -> Completed
//!                 -> Failed
//!                 -> Cancelled
//! ```

use serde::Serialize;
use std::fmt;

/// Represents the current state of a crawl job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    /// Job created, loop not yet started
    Idle,

    /// Breadth-first loop is in progress
    Running,

    /// Frontier drained normally
    Completed,

    /// Stopped by an internal invariant violation
    Failed,

    /// Stopped at a dequeue boundary after a cancellation request
    Cancelled,
}

impl JobState {
    /// Returns true if the job can no longer change state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: JobState) -> bool {
        matches!(
            (self, next),
            (Self::Idle, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Running, Self::Cancelled)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns all possible job states
    pub fn all_states() -> [Self; 5] {
        [
            Self::Idle,
            Self::Running,
            Self::Completed,
            Self::Failed,
            Self::Cancelled,
        ]
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
