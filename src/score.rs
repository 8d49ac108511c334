//! Weighted scoring with category gates.
//!
//! Checks score pass=1, warn=0.5, fail=0 within their category; categories
//! aggregate through a weighted harmonic mean so one very weak category
//! drags the overall score harder than an arithmetic mean would. Hard gates
//! then cap the result for failures that make the rest moot.

use crate::checks::{Check, CheckStatus};

/// Categories a check can score under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Seo,
    Performance,
    Security,
}

impl Category {
    const ALL: [Category; 3] = [Category::Seo, Category::Performance, Category::Security];

    fn weight(self) -> f64 {
        match self {
            Category::Seo => 0.55,
            Category::Performance => 0.35,
            Category::Security => 0.10,
        }
    }
}

fn category_of(id: &str) -> Option<Category> {
    match id {
        "sitemap" | "canonical" | "robots" | "www-canonical" | "noindex" | "meta-robots"
        | "img-alt" | "viewport" | "meta-description" | "title-length" | "opengraph"
        | "favicon" => Some(Category::Seo),
        "psi" | "ttfb" | "img-size" | "img-modern" | "img-lazy" => Some(Category::Performance),
        "http" | "https-redirect" | "mixed-content" | "security-headers" | "compression"
        | "structured-data" => Some(Category::Security),
        _ => None,
    }
}

/// Relative weight of a check inside its category. Unlisted ids weigh 1.
fn weight_of(id: &str) -> f64 {
    match id {
        "noindex" => 5.0,
        "psi" => 2.4,
        "sitemap" => 2.2,
        "canonical" | "http" => 2.0,
        "https-redirect" | "mixed-content" => 1.8,
        "robots" => 1.6,
        "structured-data" => 1.4,
        "ttfb" => 1.4,
        "www-canonical" | "img-alt" | "img-size" | "compression" => 1.2,
        "viewport" => 1.1,
        "security-headers" | "meta-robots" => 1.0,
        "meta-description" | "title-length" | "img-modern" => 0.8,
        "img-lazy" => 0.6,
        "opengraph" => 0.5,
        "favicon" => 0.3,
        _ => 1.0,
    }
}

fn value_of(status: CheckStatus) -> f64 {
    match status {
        CheckStatus::Pass => 1.0,
        CheckStatus::Warn => 0.5,
        CheckStatus::Fail => 0.0,
        CheckStatus::Locked => 0.0,
    }
}

fn failed(checks: &[Check], id: &str) -> bool {
    checks.iter().any(|c| c.id == id && c.failed())
}

/// Computes the overall 0-100 score for a report's checks.
///
/// Locked placeholders and the `blocked`/`timeout` markers never score.
/// Categories with no scorable checks are excluded from the aggregate.
pub fn score_checks(checks: &[Check]) -> u32 {
    let mut sums = [(0.0_f64, 0.0_f64); 3];
    for check in checks {
        if check.is_locked() || check.id == "blocked" || check.id == "timeout" {
            continue;
        }
        let Some(category) = category_of(&check.id) else {
            continue;
        };
        let slot = Category::ALL
            .iter()
            .position(|c| *c == category)
            .expect("category is in ALL");
        let weight = weight_of(&check.id);
        sums[slot].0 += weight * value_of(check.status);
        sums[slot].1 += weight;
    }

    let mut weight_total = 0.0;
    let mut reciprocal_total = 0.0;
    for (slot, category) in Category::ALL.iter().enumerate() {
        let (weighted, weights) = sums[slot];
        if weights <= 0.0 {
            continue;
        }
        let score = (weighted / weights).clamp(0.05, 1.0);
        weight_total += category.weight();
        reciprocal_total += category.weight() / score;
    }
    if weight_total <= 0.0 {
        return 0;
    }

    let harmonic = weight_total / reciprocal_total;
    let mut score = (harmonic * 100.0).round() as u32;

    // Gates, in order: failures that invalidate the page cap everything.
    if failed(checks, "noindex") {
        return 0;
    }
    if failed(checks, "http") {
        score = score.min(40);
    }
    if failed(checks, "canonical") {
        score = score.min(65);
    }
    if failed(checks, "sitemap") || failed(checks, "robots") {
        score = score.min(80);
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::{locked_placeholders, Check};

    fn healthy_checks() -> Vec<Check> {
        let mut checks = vec![
            Check::pass("http", "200"),
            Check::pass("ttfb", "fast"),
            Check::pass("title-length", "ok"),
            Check::pass("meta-description", "ok"),
            Check::pass("viewport", "ok"),
            Check::pass("canonical", "ok"),
            Check::pass("robots", "ok"),
            Check::pass("sitemap", "ok"),
            Check::pass("noindex", "ok"),
            Check::pass("meta-robots", "ok"),
            Check::pass("www-canonical", "ok"),
            Check::pass("img-alt", "ok"),
            Check::warn("img-modern", "none"),
            Check::warn("img-lazy", "none"),
            Check::pass("img-size", "ok"),
            Check::warn("opengraph", "partial"),
            Check::pass("favicon", "ok"),
        ];
        checks.extend(locked_placeholders());
        checks
    }

    #[test]
    fn output_is_bounded() {
        let score = score_checks(&healthy_checks());
        assert!(score <= 100);
        assert!(score >= 80, "healthy site should score high, got {score}");
    }

    #[test]
    fn all_pass_scores_100() {
        let checks: Vec<Check> = healthy_checks()
            .into_iter()
            .filter(|c| !c.is_locked())
            .map(|c| Check::pass(&c.id.clone(), "ok"))
            .collect();
        assert_eq!(score_checks(&checks), 100);
    }

    #[test]
    fn noindex_failure_zeroes_the_score() {
        let mut checks = healthy_checks();
        for check in checks.iter_mut() {
            if check.id == "noindex" {
                *check = Check::fail("noindex", "noindex set");
            }
        }
        assert_eq!(score_checks(&checks), 0);
    }

    #[test]
    fn http_failure_caps_at_40() {
        let mut checks = healthy_checks();
        for check in checks.iter_mut() {
            if check.id == "http" {
                *check = Check::fail("http", "500");
            }
        }
        assert!(score_checks(&checks) <= 40);
    }

    #[test]
    fn canonical_failure_caps_at_65() {
        let mut checks = healthy_checks();
        for check in checks.iter_mut() {
            if check.id == "canonical" {
                *check = Check::fail("canonical", "missing");
            }
        }
        assert!(score_checks(&checks) <= 65);
    }

    #[test]
    fn sitemap_or_robots_failure_caps_at_80() {
        let mut checks = healthy_checks();
        for check in checks.iter_mut() {
            if check.id == "sitemap" {
                *check = Check::fail("sitemap", "missing");
            }
        }
        assert!(score_checks(&checks) <= 80);
    }

    #[test]
    fn canonical_warn_applies_no_cap() {
        let mut checks = healthy_checks();
        for check in checks.iter_mut() {
            if check.id == "canonical" {
                *check = Check::warn("canonical", "multiple canonicals");
            }
        }
        assert!(score_checks(&checks) > 65);
    }

    #[test]
    fn locked_and_degraded_markers_never_score() {
        let only_locked: Vec<Check> = locked_placeholders();
        assert_eq!(score_checks(&only_locked), 0);

        let with_markers = vec![
            Check::fail("blocked", "403"),
            Check::warn("timeout", "slow"),
            Check::pass("robots", "ok"),
        ];
        // Only robots scores; one passing SEO check aggregates to 100.
        assert_eq!(score_checks(&with_markers), 100);
    }

    #[test]
    fn weak_category_drags_harder_than_arithmetic_mean() {
        let checks = vec![
            Check::pass("canonical", "ok"),
            Check::pass("robots", "ok"),
            Check::pass("noindex", "ok"),
            Check::fail("ttfb", "slow"),
            Check::fail("img-size", "heavy"),
            Check::pass("http", "ok"),
        ];
        // Performance is clamped to 0.05; harmonic mean punishes it.
        let score = score_checks(&checks);
        assert!(score < 50, "harmonic aggregation should sink the score, got {score}");
    }
}
