//! Degraded terminal paths: BLOCKED and TIMEOUT reports.
//!
//! Both still deliver value: best-effort robots, sitemap discovery, and
//! favicon findings plus the locked placeholders, so the caller gets a
//! partial picture instead of an error.

use crate::checks::{
    blocked_check, classify_favicon, classify_psi, classify_robots, classify_sitemap,
    locked_placeholders, timeout_check, Check,
};
use crate::models::Report;
use crate::normalize::origin_of;
use crate::score::score_checks;

use super::AuditRun;

impl AuditRun {
    /// Report for an origin that refused automated access twice.
    pub(super) async fn blocked_report(
        &mut self,
        raw: &str,
        normalized: &str,
        final_url: &str,
        status: u16,
    ) -> Report {
        let origin = origin_of(final_url).unwrap_or_else(|| normalized.to_string());

        let mut checks: Vec<Check> = vec![blocked_check(status)];
        let robots = self.probe_robots(&origin).await;
        checks.push(classify_robots(&robots));
        let sitemap = self.probe_sitemap(&origin, &robots.sitemaps, false).await;
        checks.push(classify_sitemap(&sitemap));
        let favicon = self.probe_favicon(None, final_url).await;
        checks.push(classify_favicon(favicon));
        checks.extend(locked_placeholders());

        let score = score_checks(&checks);
        Report {
            ok: true,
            url: raw.to_string(),
            normalized_url: normalized.to_string(),
            final_url: final_url.to_string(),
            fetched_status: status,
            timing_ms: self.budget.elapsed_ms(),
            title: String::new(),
            meta_description: String::new(),
            speed: None,
            score: Some(score),
            checks,
            blocked: Some(true),
            timeout: None,
            cached: None,
            cache_age_ms: None,
            share_blob_path: None,
            share_blob_url: None,
            share_url: None,
            diag: self.take_diag(),
        }
    }

    /// Report for a page that never answered within its deadline.
    pub(super) async fn timeout_report(&mut self, raw: &str, normalized: &str) -> Report {
        let origin = origin_of(normalized).unwrap_or_else(|| normalized.to_string());

        let mut checks: Vec<Check> = vec![timeout_check(self.config.budget_ms)];
        let favicon = self.probe_favicon(None, normalized).await;
        checks.push(classify_favicon(favicon));
        let robots = self.probe_robots(&origin).await;
        checks.push(classify_robots(&robots));
        let sitemap = self.probe_sitemap(&origin, &robots.sitemaps, false).await;
        checks.push(classify_sitemap(&sitemap));
        let psi = self.probe_psi(normalized).await;
        if let Some(score) = psi {
            checks.push(classify_psi(score));
        }
        checks.extend(locked_placeholders());

        let score = score_checks(&checks);
        Report {
            ok: true,
            url: raw.to_string(),
            normalized_url: normalized.to_string(),
            final_url: normalized.to_string(),
            fetched_status: 0,
            timing_ms: self.config.budget_ms,
            title: String::new(),
            meta_description: String::new(),
            speed: psi,
            score: Some(score),
            checks,
            blocked: None,
            timeout: Some(true),
            cached: None,
            cache_age_ms: None,
            share_blob_path: None,
            share_blob_url: None,
            share_url: None,
            diag: self.take_diag(),
        }
    }
}
