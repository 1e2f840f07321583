//! Configuration module for Ripple-Watch
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use ripple_watch::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("ripple.toml")).unwrap();
//! println!("Default crawl depth: {}", config.crawler.default_max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, PublisherConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::{validate, validate_block_pattern};
