use crate::UrlError;
use url::Url;

/// Normalizes a URL, resolving it against `base` when it is relative
///
/// # Normalization Steps
///
/// 1. Resolve against the base URL (if given) or parse as absolute
/// 2. Reject anything that is not HTTP or HTTPS
/// 3. Reject URLs without a host
/// 4. Lowercase the host
/// 5. Remove the port when it is the scheme's default
/// 6. Remove fragment (everything after #)
///
/// Dot segments are resolved and an empty path becomes `/` by the parser
/// itself. Path, query and their casing are otherwise left untouched, so
/// two URLs only collapse when a server could not tell them apart.
///
/// Normalizing an already normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use ripple_watch::url::normalize_url;
///
/// let url = normalize_url("HTTP://Example.COM:80/a/../b#top", None).unwrap();
/// assert_eq!(url.as_str(), "http://example.com/b");
/// ```
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(UrlError::Parse("empty URL".to_string()));
    }

    let mut url = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    }
    .map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    let host = match url.host_str() {
        Some(host) if !host.is_empty() => host.to_lowercase(),
        _ => return Err(UrlError::MissingDomain),
    };
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Malformed(format!("Failed to set host: {}", e)))?;

    if let (Some(port), Some(default)) = (url.port(), default_port(url.scheme())) {
        if port == default {
            url.set_port(None)
                .map_err(|_| UrlError::Malformed(format!("Failed to clear port on {}", raw)))?;
        }
    }

    url.set_fragment(None);

    if url.path().is_empty() {
        url.set_path("/");
    }

    Ok(url)
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}
