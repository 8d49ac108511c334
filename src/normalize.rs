//! Target URL validation, normalization, and canonical-key derivation.

use url::Url;

use crate::config::MAX_URL_LENGTH;
use crate::error_handling::ApiError;

/// Validates a user-supplied target and normalizes it to an absolute URL.
///
/// Adds an `https://` prefix when no scheme is present, rejects non-http(s)
/// schemes, hostless URLs, and anything longer than [`MAX_URL_LENGTH`].
pub fn normalize_target(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ApiError::InvalidInput("url must be a non-empty string".into()));
    }
    if trimmed.len() > MAX_URL_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "url exceeds {MAX_URL_LENGTH} characters"
        )));
    }

    let normalized = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    };
    if normalized.len() > MAX_URL_LENGTH {
        return Err(ApiError::InvalidInput(format!(
            "url exceeds {MAX_URL_LENGTH} characters"
        )));
    }

    let parsed =
        Url::parse(&normalized).map_err(|e| ApiError::InvalidInput(format!("{trimmed}: {e}")))?;
    match parsed.scheme() {
        "http" | "https" => {}
        other => {
            return Err(ApiError::InvalidInput(format!(
                "unsupported scheme {other:?}"
            )))
        }
    }
    if parsed.host_str().map_or(true, str::is_empty) {
        return Err(ApiError::InvalidInput(format!("{trimmed}: missing host")));
    }

    Ok(normalized)
}

/// Derives the canonical cache key for a URL.
///
/// Drops query and fragment, collapses trailing slashes, and lowercases the
/// host. Unparseable input falls back to a trimmed lowercase copy so lookups
/// stay total.
pub fn normalize_key(url: &str) -> String {
    let Ok(parsed) = Url::parse(url.trim()) else {
        return url.trim().trim_end_matches('/').to_ascii_lowercase();
    };
    let host = parsed.host_str().unwrap_or("").to_ascii_lowercase();
    let port = match parsed.port() {
        Some(p) => format!(":{p}"),
        None => String::new(),
    };
    let path = parsed.path().trim_end_matches('/');
    format!("{}://{}{}{}", parsed.scheme(), host, port, path)
}

/// Whether two URLs are canonically equal: query, fragment, trailing slash,
/// and host case are ignored.
pub fn canonical_matches(a: &str, b: &str) -> bool {
    normalize_key(a) == normalize_key(b)
}

/// Builds the www-variant of a URL by flipping the `www.` host prefix.
///
/// Returns `None` when the host is an IP address or otherwise has no
/// meaningful variant.
pub fn www_variant(url: &str) -> Option<String> {
    let mut parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    if host.parse::<std::net::IpAddr>().is_ok() {
        return None;
    }
    let flipped = match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => {
            // Flipping "example.com" to "www.example.com" only makes sense
            // for registrable domains, not single labels like "localhost".
            if !host.contains('.') {
                return None;
            }
            format!("www.{host}")
        }
    };
    parsed.set_host(Some(&flipped)).ok()?;
    Some(parsed.to_string())
}

/// Resolves a possibly-relative href against a base URL.
pub fn resolve_href(base: &str, href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        return Some(href.to_string());
    }
    if let Some(rest) = href.strip_prefix("//") {
        return Some(format!("https://{rest}"));
    }
    Url::parse(base)
        .ok()
        .and_then(|b| b.join(href).ok())
        .map(|u| u.to_string())
}

/// Returns the `scheme://host[:port]` origin of a URL.
pub fn origin_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?;
    Some(match parsed.port() {
        Some(port) => format!("{}://{}:{}", parsed.scheme(), host, port),
        None => format!("{}://{}", parsed.scheme(), host),
    })
}
