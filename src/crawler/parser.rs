//! HTML parser for extracting links and the page title
//!
//! Bodies are decoded lossily and handed to a tolerant HTML5 parser, so
//! malformed or non-HTML content never fails: it simply yields an empty
//! title and no links.

use crate::url::normalize_url;
use scraper::{Html, Selector};
use url::Url;

/// Extracted information from a fetched body
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    /// Text of the first `<title>` element, trimmed; empty when absent
    pub title: String,

    /// Normalized absolute links in document order
    pub links: Vec<Url>,

    /// Length of the raw body in bytes
    pub size_bytes: u64,
}

/// Extracts the title and outbound links from a response body
///
/// # Link Extraction Rules
///
/// **Include:**
/// - Every `<a href="...">`, resolved against `base_url`
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links (same page anchors)
/// - Anything that does not resolve to an absolute http(s) URL
///
/// # Example
///
/// ```no_run
/// use ripple_watch::crawler::extract;
/// use url::Url;
///
/// let html = r#"<html><head><title>Test</title></head><body><a href="/page">Link</a></body></html>"#;
/// let base_url = Url::parse("https://example.com/").unwrap();
/// let page = extract(html.as_bytes(), &base_url);
/// assert_eq!(page.title, "Test");
/// ```
pub fn extract(body: &[u8], base_url: &Url) -> ExtractedPage {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    ExtractedPage {
        title: extract_title(&document),
        links: extract_links(&document, base_url),
        size_bytes: body.len() as u64,
    }
}

fn extract_title(document: &Html) -> String {
    let Ok(title_selector) = Selector::parse("title") else {
        return String::new();
    };

    document
        .select(&title_selector)
        .next()
        .map(|element| element.text().collect::<String>().trim().to_string())
        .unwrap_or_default()
}

fn extract_links(document: &Html, base_url: &Url) -> Vec<Url> {
    let mut links = Vec::new();

    if let Ok(a_selector) = Selector::parse("a[href]") {
        for element in document.select(&a_selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(absolute_url) = resolve_link(href, base_url) {
                    links.push(absolute_url);
                }
            }
        }
    }

    links
}

/// Resolves an href to a normalized absolute URL
///
/// Returns None if the link should be excluded
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    match normalize_url(href, Some(base_url)) {
        Ok(url) => Some(url),
        Err(e) => {
            tracing::trace!("Dropping link {:?}: {}", href, e);
            None
        }
    }
}
