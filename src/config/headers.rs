//! Outbound header profiles.
//!
//! Two profiles exist: a light default profile, and a richer "browser"
//! profile used when an origin rejects minimal clients (WAF retries).
//! Every probe additionally sends `Cache-Control: no-store` so origins and
//! intermediaries never serve us a stale page.

use reqwest::header::{HeaderName, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, REFERER};
use reqwest::RequestBuilder;

/// Applies the default header profile.
pub(crate) fn apply_default_profile(builder: RequestBuilder) -> RequestBuilder {
    builder
        .header(CACHE_CONTROL, "no-store")
        .header(ACCEPT, "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
}

/// Applies the browser header profile.
///
/// Mimics a modern Chrome navigation closely enough that header-analysis
/// bot detection lets the retry through. JA3 TLS fingerprinting will still
/// identify rustls; combined with a realistic header set that is sufficient
/// for the origins this engine meets in practice.
pub(crate) fn apply_browser_profile(builder: RequestBuilder) -> RequestBuilder {
    builder
        .header(CACHE_CONTROL, "no-store")
        .header(
            ACCEPT,
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8,application/signed-exchange;v=b3;q=0.7",
        )
        .header(ACCEPT_LANGUAGE, "en-US,en;q=0.9")
        .header(REFERER, "https://www.google.com/")
        .header(HeaderName::from_static("sec-fetch-dest"), "document")
        .header(HeaderName::from_static("sec-fetch-mode"), "navigate")
        .header(HeaderName::from_static("sec-fetch-site"), "cross-site")
        .header(HeaderName::from_static("sec-fetch-user"), "?1")
        .header(
            HeaderName::from_static("sec-ch-ua"),
            "\"Chromium\";v=\"131\", \"Google Chrome\";v=\"131\", \"Not_A Brand\";v=\"24\"",
        )
        .header(HeaderName::from_static("sec-ch-ua-mobile"), "?0")
        .header(HeaderName::from_static("sec-ch-ua-platform"), "\"Windows\"")
        .header(HeaderName::from_static("upgrade-insecure-requests"), "1")
}
