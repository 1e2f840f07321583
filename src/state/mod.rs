//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `JobState`: lifecycle of a crawl job (idle, running, completed, failed, cancelled)

mod job_state;

pub use job_state::JobState;
