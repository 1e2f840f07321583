//! Domain policy filter
//!
//! Decides whether a URL may be fetched given an allow-list of domains and
//! a block-list of domains or path suffixes. The block-list is consulted
//! first and always wins, so asset extensions such as ".js" stay excluded
//! even on allowed hosts.

use crate::url::matcher::{matches_domain, matches_suffix, matches_wildcard};
use url::Url;

/// Outcome of evaluating a URL against a [`DomainPolicy`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    /// The URL may be fetched
    Allowed,
    /// The URL matched this block pattern
    Blocked(String),
    /// An allow-list exists and the host is not on it
    NotAllowed,
}

impl PolicyDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Allow/block rules for one crawl job
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainPolicy {
    allowed: Vec<String>,
    blocked: Vec<String>,
}

impl DomainPolicy {
    /// Builds a policy from raw user-supplied patterns
    ///
    /// Patterns are trimmed and lowercased and blank entries are dropped.
    /// An allow pattern given as a full URL ("https://example.com/") is
    /// reduced to its host.
    pub fn new<A, B>(allowed: A, blocked: B) -> Self
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        B: IntoIterator,
        B::Item: AsRef<str>,
    {
        Self {
            allowed: allowed
                .into_iter()
                .filter_map(|p| clean_allow_pattern(p.as_ref()))
                .collect(),
            blocked: blocked
                .into_iter()
                .filter_map(|p| clean_pattern(p.as_ref()))
                .collect(),
        }
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn blocked(&self) -> &[String] {
        &self.blocked
    }

    /// Evaluates a URL against the rules
    ///
    /// # Rule Precedence
    ///
    /// 1. Block-list: reject if the host or path matches any block pattern
    /// 2. Allow-list: if non-empty, the host must equal or be a subdomain
    ///    of one of its entries
    /// 3. Otherwise allow
    pub fn evaluate(&self, url: &Url) -> PolicyDecision {
        let host = url.host_str().unwrap_or_default().to_lowercase();
        let path = url.path();

        if let Some(pattern) = self
            .blocked
            .iter()
            .find(|pattern| block_pattern_matches(pattern, &host, path))
        {
            return PolicyDecision::Blocked(pattern.clone());
        }

        if !self.allowed.is_empty()
            && !self
                .allowed
                .iter()
                .any(|pattern| matches_domain(pattern, &host))
        {
            return PolicyDecision::NotAllowed;
        }

        PolicyDecision::Allowed
    }

    /// Returns true if the URL passes the policy
    pub fn is_allowed(&self, url: &Url) -> bool {
        self.evaluate(url).is_allowed()
    }
}

/// Convenience wrapper that builds a one-off policy and evaluates `url`
///
/// # Examples
///
/// ```
/// use ripple_watch::url::is_allowed;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/style.css").unwrap();
/// assert!(!is_allowed(&url, &["example.com"], &[".css"]));
/// ```
pub fn is_allowed<A, B>(url: &Url, allowed: &[A], blocked: &[B]) -> bool
where
    A: AsRef<str>,
    B: AsRef<str>,
{
    DomainPolicy::new(allowed.iter(), blocked.iter()).is_allowed(url)
}

fn block_pattern_matches(pattern: &str, host: &str, path: &str) -> bool {
    if pattern.starts_with("*.") {
        matches_wildcard(pattern, host)
    } else if pattern.starts_with('.') {
        matches_suffix(pattern, path) || matches_suffix(pattern, host)
    } else {
        matches_domain(pattern, host)
    }
}

fn clean_pattern(raw: &str) -> Option<String> {
    let pattern = raw.trim().to_lowercase();
    (!pattern.is_empty()).then_some(pattern)
}

fn clean_allow_pattern(raw: &str) -> Option<String> {
    let pattern = clean_pattern(raw)?;
    if pattern.contains("://") {
        return Url::parse(&pattern)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string));
    }
    let host = strip_port(pattern.split('/').next().unwrap_or_default());
    (!host.is_empty()).then(|| host.to_string())
}

/// Drops a trailing `:port`; policies match hosts on any port
fn strip_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((name, port))
            if !port.is_empty()
                && port.bytes().all(|b| b.is_ascii_digit())
                && (!name.contains(':') || name.ends_with(']')) =>
        {
            name
        }
        _ => host,
    }
}
