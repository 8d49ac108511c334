//! Threshold rules mapping raw probe outcomes to findings.

use crate::checks::Check;

/// Meta description bounds (inclusive).
const META_DESCRIPTION_RANGE: (usize, usize) = (50, 160);
/// Title length bounds (inclusive).
const TITLE_RANGE: (usize, usize) = (15, 60);
/// TTFB threshold in milliseconds.
const TTFB_WARN_MS: u64 = 1_500;
/// PSI score threshold.
const PSI_PASS: u32 = 70;
/// Alt-coverage thresholds.
const ALT_PASS_RATIO: f64 = 0.90;
const ALT_WARN_RATIO: f64 = 0.60;

/// `http`: status below 400 passes.
pub fn classify_http(status: u16) -> Check {
    let check = if status < 400 {
        Check::pass("http", format!("Page responded with HTTP {status}"))
    } else {
        Check::fail("http", format!("Page responded with HTTP {status}"))
    };
    check.with_number(f64::from(status))
}

/// `ttfb`: first response under 1500 ms passes, otherwise warns.
pub fn classify_ttfb(timing_ms: u64) -> Check {
    let check = if timing_ms < TTFB_WARN_MS {
        Check::pass("ttfb", format!("First response in {timing_ms} ms"))
    } else {
        Check::warn(
            "ttfb",
            format!("First response took {timing_ms} ms (target under {TTFB_WARN_MS} ms)"),
        )
    };
    check.with_number(timing_ms as f64)
}

/// `opengraph`: og:title plus a loadable og:image passes; any OG tag warns;
/// none fails.
pub fn classify_opengraph(
    og_title: Option<&str>,
    og_image: Option<&str>,
    image_loads: Option<bool>,
) -> Check {
    let has_title = og_title.is_some_and(|t| !t.is_empty());
    let has_image = og_image.is_some_and(|i| !i.is_empty());
    if has_title && has_image && image_loads != Some(false) {
        Check::pass("opengraph", "og:title and og:image are set")
    } else if has_title || has_image {
        let details = if has_image && image_loads == Some(false) {
            "og:image is set but did not load"
        } else if has_title {
            "og:title is set but og:image is missing"
        } else {
            "og:image is set but og:title is missing"
        };
        Check::warn("opengraph", details)
    } else {
        Check::fail("opengraph", "No Open Graph tags found")
    }
}

/// `favicon`: `Some(true)` loads, `Some(false)` failed to load, `None` was
/// never probed.
pub fn classify_favicon(loads: Option<bool>) -> Check {
    match loads {
        Some(true) => Check::pass("favicon", "Favicon loads").with_bool(true),
        Some(false) => Check::warn("favicon", "Favicon did not load").with_bool(false),
        None => Check::fail("favicon", "Unknown: favicon was not checked"),
    }
}

/// Raw robots.txt probe outcome.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RobotsOutcome {
    /// Whether robots.txt returned 2xx.
    pub exists: bool,
    /// Whether the `*` agent group contains `Disallow: /`.
    pub disallow_all: bool,
    /// Sitemap URLs advertised via `Sitemap:` lines.
    pub sitemaps: Vec<String>,
}

/// `robots`: present without a blanket disallow passes; a blanket disallow
/// fails; absence warns.
pub fn classify_robots(outcome: &RobotsOutcome) -> Check {
    if outcome.exists && outcome.disallow_all {
        Check::fail("robots", "robots.txt disallows all crawling (Disallow: /)")
    } else if outcome.exists {
        Check::pass("robots", "robots.txt found")
    } else {
        Check::warn("robots", "No robots.txt found")
    }
}

/// Raw sitemap probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapOutcome {
    /// Discovered, parsed, and a sampled URL answered 2xx/3xx.
    Verified { url: String, locs: usize },
    /// Discovered but not fully verified (sampling failed, skipped, or the
    /// file had no `<loc>` entries).
    Unverified { url: String, reason: String },
    /// Discovered but gzip-compressed; content parsing is skipped.
    Gzipped { url: String },
    /// No sitemap found at any candidate location.
    Missing,
}

/// `sitemap`: per the [`SitemapOutcome`] ladder.
pub fn classify_sitemap(outcome: &SitemapOutcome) -> Check {
    match outcome {
        SitemapOutcome::Verified { url, locs } => Check::pass(
            "sitemap",
            format!("Sitemap at {url} with {locs} URLs; sampled URL responds"),
        ),
        SitemapOutcome::Unverified { url, reason } => {
            Check::warn("sitemap", format!("Sitemap at {url}: {reason}"))
        }
        SitemapOutcome::Gzipped { url } => Check::warn(
            "sitemap",
            format!("Sitemap at {url} is gzipped; contents not verified"),
        ),
        SitemapOutcome::Missing => Check::fail("sitemap", "No sitemap found"),
    }
}

/// Raw www-variant probe outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VariantOutcome {
    /// Variant host redirects (301/302/307/308) to the canonical host.
    Redirects { from: String },
    /// Variant answered but not with a redirect to the canonical host.
    NoRedirect { from: String, status: u16 },
    /// Probe skipped or failed; also covers hosts with no variant.
    NotApplicable,
}

/// `www-canonical`: a clean redirect from the variant host passes; anything
/// else warns.
pub fn classify_www(outcome: &VariantOutcome) -> Check {
    match outcome {
        VariantOutcome::Redirects { from } => Check::pass(
            "www-canonical",
            format!("{from} redirects to the canonical host"),
        ),
        VariantOutcome::NoRedirect { from, status } => Check::warn(
            "www-canonical",
            format!("{from} answered HTTP {status} without redirecting to the canonical host"),
        ),
        VariantOutcome::NotApplicable => {
            Check::warn("www-canonical", "Unknown: variant host was not tested")
        }
    }
}

/// `canonical`: exactly one tag resolving to the final URL passes; multiple
/// or mismatched tags warn; absence fails.
pub fn classify_canonical(resolved: &[String], final_url: &str) -> Check {
    match resolved {
        [] => Check::fail("canonical", "No canonical tag found"),
        [only] => {
            if crate::normalize::canonical_matches(only, final_url) {
                Check::pass("canonical", "Canonical tag matches the page URL")
            } else {
                Check::warn(
                    "canonical",
                    format!("Canonical tag points to {only}, not the page URL"),
                )
            }
        }
        many => Check::warn(
            "canonical",
            format!("{} canonical tags found; expected exactly one", many.len()),
        ),
    }
}

fn has_noindex(directive: &str) -> bool {
    directive
        .split(',')
        .map(str::trim)
        .any(|token| token.eq_ignore_ascii_case("noindex") || token.eq_ignore_ascii_case("none"))
}

/// `noindex` + `meta-robots` from the meta triad and the `X-Robots-Tag`
/// header. Sources are `(name, content)` pairs for any that were present.
pub fn classify_indexability(sources: &[(&str, String)]) -> (Check, Check) {
    let offender = sources.iter().find(|(_, content)| has_noindex(content));

    let noindex = match offender {
        Some((source, content)) => Check::fail(
            "noindex",
            format!("{source} contains a noindex directive ({})", content.trim()),
        ),
        None => Check::pass("noindex", "Page is indexable"),
    };

    // Informational companion: noindex presence already fails above.
    let meta_robots = if offender.is_some() {
        Check::warn("meta-robots", "Robots directives include noindex")
    } else if sources.is_empty() {
        Check::pass("meta-robots", "No robots directives set")
    } else {
        Check::pass("meta-robots", "Robots directives set without noindex")
    };

    (noindex, meta_robots)
}

/// `meta-description`: 50-160 characters passes; present outside the range
/// warns; missing fails.
pub fn classify_meta_description(description: &str) -> Check {
    let len = description.chars().count();
    let (lo, hi) = META_DESCRIPTION_RANGE;
    if description.is_empty() {
        Check::fail("meta-description", "Missing meta description")
    } else if (lo..=hi).contains(&len) {
        Check::pass(
            "meta-description",
            format!("Meta description is {len} characters"),
        )
        .with_number(len as f64)
    } else {
        Check::warn(
            "meta-description",
            format!("Meta description is {len} characters (recommended {lo}-{hi})"),
        )
        .with_number(len as f64)
    }
}

/// `title-length`: 15-60 characters passes; present outside the range warns;
/// missing fails.
pub fn classify_title(title: &str) -> Check {
    let len = title.chars().count();
    let (lo, hi) = TITLE_RANGE;
    if title.is_empty() {
        Check::fail("title-length", "Missing <title>")
    } else if (lo..=hi).contains(&len) {
        Check::pass("title-length", format!("Title is {len} characters")).with_number(len as f64)
    } else {
        Check::warn(
            "title-length",
            format!("Title is {len} characters (recommended {lo}-{hi})"),
        )
        .with_number(len as f64)
    }
}

/// `viewport`: the meta viewport tag must be present.
pub fn classify_viewport(present: bool) -> Check {
    if present {
        Check::pass("viewport", "Viewport meta tag present")
    } else {
        Check::fail("viewport", "Missing viewport meta tag")
    }
}

/// `img-alt`: at least 90% of images carry non-empty alt text; 60-89% warns;
/// below fails. Pages without images pass.
pub fn classify_img_alt(total: usize, with_alt: usize) -> Check {
    if total == 0 {
        return Check::pass("img-alt", "No images on the page").with_number(1.0);
    }
    let ratio = with_alt as f64 / total as f64;
    let details = format!("{with_alt} of {total} images have alt text");
    let check = if ratio >= ALT_PASS_RATIO {
        Check::pass("img-alt", details)
    } else if ratio >= ALT_WARN_RATIO {
        Check::warn("img-alt", details)
    } else {
        Check::fail("img-alt", details)
    };
    check.with_number((ratio * 100.0).round() / 100.0)
}

/// `img-modern`: at least one AVIF/WebP source passes; none warns.
pub fn classify_img_modern(modern: usize) -> Check {
    if modern > 0 {
        Check::pass("img-modern", format!("{modern} images use AVIF/WebP"))
            .with_number(modern as f64)
    } else {
        Check::warn("img-modern", "No AVIF/WebP images found").with_number(0.0)
    }
}

/// `img-size`: zero oversized probed images passes; one or two warn; three
/// or more fail.
pub fn classify_img_size(oversized: usize, probed: usize) -> Check {
    let check = if oversized == 0 {
        Check::pass(
            "img-size",
            format!("No oversized images among {probed} probed"),
        )
    } else if oversized <= 2 {
        Check::warn("img-size", format!("{oversized} images exceed 300 KB"))
    } else {
        Check::fail("img-size", format!("{oversized} images exceed 300 KB"))
    };
    check.with_number(oversized as f64)
}

/// `img-lazy`: at least one `loading="lazy"` image passes; none warns.
pub fn classify_img_lazy(lazy: usize) -> Check {
    if lazy > 0 {
        Check::pass("img-lazy", format!("{lazy} images are lazy-loaded")).with_number(lazy as f64)
    } else {
        Check::warn("img-lazy", "No lazy-loaded images found").with_number(0.0)
    }
}

/// `psi`: score of 70 or above passes, below warns. Callers omit the check
/// entirely when PSI was not probed.
pub fn classify_psi(score: u32) -> Check {
    let check = if score >= PSI_PASS {
        Check::pass("psi", format!("PageSpeed performance score {score}"))
    } else {
        Check::warn(
            "psi",
            format!("PageSpeed performance score {score} (target {PSI_PASS}+)"),
        )
    };
    check.with_number(f64::from(score))
}

/// `blocked`: always a failure when emitted.
pub fn blocked_check(status: u16) -> Check {
    Check::fail(
        "blocked",
        format!("Origin refused automated access (HTTP {status}) even with browser headers"),
    )
    .with_number(f64::from(status))
}

/// `timeout`: always a warning when emitted.
pub fn timeout_check(budget_ms: u64) -> Check {
    Check::warn(
        "timeout",
        format!("Page did not respond within the {budget_ms} ms budget"),
    )
}
