//! URL handling module for Ripple-Watch
//!
//! This module provides URL normalization, domain extraction, wildcard
//! matching, and the allow/block policy filter.

mod matcher;
mod normalize;
mod policy;

use ::url::Url;

// Re-export main functions
pub use matcher::{matches_domain, matches_suffix, matches_wildcard};
pub use normalize::normalize_url;
pub use policy::{is_allowed, DomainPolicy, PolicyDecision};

/// Extracts the lowercase host of a URL, without port
///
/// # Examples
///
/// ```
/// use url::Url;
/// use ripple_watch::url::extract_domain;
///
/// let url = Url::parse("https://Sub.Example.COM:8080/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}
