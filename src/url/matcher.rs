/// Checks if a domain matches a wildcard pattern
///
/// This function supports two types of patterns:
/// 1. Exact match: "example.com" matches only "example.com"
/// 2. Wildcard match: "*.example.com" matches:
///    - "example.com" (the bare domain)
///    - "blog.example.com" (single subdomain)
///    - "api.v2.example.com" (nested subdomains)
///
/// # Examples
///
/// ```
/// use ripple_watch::url::matches_wildcard;
///
/// assert!(matches_wildcard("example.com", "example.com"));
/// assert!(!matches_wildcard("example.com", "blog.example.com"));
/// assert!(matches_wildcard("*.example.com", "blog.example.com"));
/// assert!(!matches_wildcard("*.example.com", "example.org"));
/// ```
pub fn matches_wildcard(pattern: &str, candidate: &str) -> bool {
    if let Some(base) = pattern.strip_prefix("*.") {
        candidate == base || is_subdomain_of(candidate, base)
    } else {
        candidate == pattern
    }
}

/// Checks if a host equals a domain pattern or is one of its subdomains
///
/// A leading "*." on the pattern is accepted and ignored, so "example.com"
/// and "*.example.com" behave the same here.
///
/// ```
/// use ripple_watch::url::matches_domain;
///
/// assert!(matches_domain("example.com", "example.com"));
/// assert!(matches_domain("example.com", "docs.example.com"));
/// assert!(!matches_domain("example.com", "notexample.com"));
/// ```
pub fn matches_domain(pattern: &str, host: &str) -> bool {
    let base = pattern.strip_prefix("*.").unwrap_or(pattern);
    !base.is_empty() && (host == base || is_subdomain_of(host, base))
}

/// Checks if `text` ends with `suffix`, ignoring ASCII case
pub fn matches_suffix(suffix: &str, text: &str) -> bool {
    text.len() >= suffix.len()
        && text.is_char_boundary(text.len() - suffix.len())
        && text[text.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}

fn is_subdomain_of(host: &str, base: &str) -> bool {
    host.len() > base.len()
        && host.ends_with(base)
        && host.as_bytes()[host.len() - base.len() - 1] == b'.'
}
