//! The audit orchestrator.
//!
//! Drives one audit end to end: normalize the target, fetch the page under
//! the PAGE deadline, degrade to the BLOCKED or TIMEOUT path when the origin
//! refuses or stalls, otherwise extract the HTML and walk the probe sequence.
//! Every probe is isolated: its failure degrades only its own check.

mod degraded;
mod probes;
mod sitemap;

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::Method;

use crate::budget::AuditBudget;
use crate::checks::{
    classify_canonical, classify_favicon, classify_http, classify_img_alt, classify_img_lazy,
    classify_img_modern, classify_img_size, classify_indexability, classify_meta_description,
    classify_opengraph, classify_psi, classify_robots, classify_sitemap, classify_title,
    classify_ttfb, classify_viewport, classify_www, locked_placeholders, Check,
};
use crate::config::{AuditConfig, PAGE_TIMEOUT_MS, RETRY_BASE_DELAY_MS, RETRY_TRIES, SMALL_TIMEOUT_MS};
use crate::error_handling::ApiError;
use crate::extract::PageExtract;
use crate::models::{DiagEntry, Report};
use crate::normalize::{normalize_target, origin_of, resolve_href};
use crate::probe::{retry, FetchOptions, ProbeError, Prober};
use crate::score::score_checks;

/// Statuses treated as "the origin refuses automated access".
const BLOCK_STATUSES: [u16; 3] = [401, 403, 429];

/// Shared audit engine: owns the prober and configuration, spawns one
/// [`AuditRun`] per request.
#[derive(Clone)]
pub struct Auditor {
    prober: Prober,
    config: Arc<AuditConfig>,
}

impl Auditor {
    /// Creates an auditor over the shared prober.
    pub fn new(prober: Prober, config: Arc<AuditConfig>) -> Self {
        Self { prober, config }
    }

    /// Runs one audit. Remote misbehavior degrades in-band; only invalid
    /// input and unexpected transport failures surface as errors.
    pub async fn run(&self, raw_url: &str) -> Result<Report, ApiError> {
        let normalized = normalize_target(raw_url)?;
        let budget = AuditBudget::new(
            Duration::from_millis(self.config.budget_ms),
            self.config.sub_request_budget,
        );
        let mut run = AuditRun {
            prober: self.prober.clone(),
            config: Arc::clone(&self.config),
            budget,
            diag: Vec::new(),
        };
        run.execute(raw_url, &normalized).await
    }
}

/// State for one in-flight audit. Exclusively owned for its duration.
pub(crate) struct AuditRun {
    prober: Prober,
    config: Arc<AuditConfig>,
    budget: AuditBudget,
    diag: Vec<DiagEntry>,
}

impl AuditRun {
    /// Fetch options for a probe of the given timeout class.
    fn opts(&self, class_ms: u64) -> FetchOptions {
        FetchOptions::new(self.budget.within(class_ms), self.budget.cancel_token())
    }

    /// Records a `_diag` timing entry when debugging is enabled.
    fn record(&mut self, probe: &str, started: Instant) {
        if self.config.debug_audit {
            self.diag.push(DiagEntry {
                probe: probe.to_string(),
                ms: started.elapsed().as_millis() as u64,
            });
        }
    }

    fn take_diag(&mut self) -> Option<Vec<DiagEntry>> {
        if self.config.debug_audit {
            Some(std::mem::take(&mut self.diag))
        } else {
            None
        }
    }

    async fn execute(&mut self, raw: &str, normalized: &str) -> Result<Report, ApiError> {
        // PAGE: follow redirects, default profile, retry on abort/transient.
        let page_started = Instant::now();
        let page_result = {
            let prober = self.prober.clone();
            let url = normalized.to_string();
            let budget = &self.budget;
            retry(
                RETRY_TRIES,
                Duration::from_millis(RETRY_BASE_DELAY_MS),
                move |_| {
                    let prober = prober.clone();
                    let url = url.clone();
                    let opts = FetchOptions::new(
                        budget.within(PAGE_TIMEOUT_MS),
                        budget.cancel_token(),
                    );
                    async move { prober.fetch(&url, Method::GET, &opts).await }
                },
            )
            .await
        };
        self.record("page", page_started);

        let mut response = match page_result {
            Ok(response) => response,
            Err(ProbeError::Aborted(_)) => {
                return Ok(self.timeout_report(raw, normalized).await);
            }
            Err(ProbeError::Transport(e)) => {
                return Err(ApiError::Unexpected(
                    anyhow::Error::new(e).context(format!("could not reach {normalized}")),
                ));
            }
        };

        // BLOCKED_RETRY: one more attempt with browser headers and a
        // shorter deadline before giving up on the origin.
        if BLOCK_STATUSES.contains(&response.status().as_u16()) {
            let retry_started = Instant::now();
            let retried = self
                .prober
                .fetch(normalized, Method::GET, &self.opts(SMALL_TIMEOUT_MS).browser())
                .await;
            self.record("blocked-retry", retry_started);
            match retried {
                Ok(r) if !BLOCK_STATUSES.contains(&r.status().as_u16()) => response = r,
                _ => {
                    let status = response.status().as_u16();
                    let final_url = response.url().to_string();
                    return Ok(self.blocked_report(raw, normalized, &final_url, status).await);
                }
            }
        }

        let fetched_status = response.status().as_u16();
        let timing_ms = page_started.elapsed().as_millis() as u64;
        let final_url = response.url().to_string();
        let x_robots_tag = response
            .headers()
            .get("x-robots-tag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let body = tokio::time::timeout(self.budget.within(PAGE_TIMEOUT_MS), response.text()).await;
        let html = match body {
            Ok(Ok(text)) => text,
            // A body that cannot be read inside the deadline is the same
            // degraded state as a page that never answered.
            _ => return Ok(self.timeout_report(raw, normalized).await),
        };

        let page = PageExtract::parse(&html);
        let origin = origin_of(&final_url).unwrap_or_else(|| normalized.to_string());

        // PROBES, in order; each degrades only its own check.
        let og_image_loads = self.probe_og_image(page.og_image.as_deref(), &final_url).await;
        let favicon_loads = self
            .probe_favicon(page.icon_href.as_deref(), &final_url)
            .await;
        let robots = self.probe_robots(&origin).await;
        let sitemap = self
            .probe_sitemap(&origin, &robots.sitemaps, true)
            .await;
        let variant = self.probe_www_variant(&final_url).await;
        let (img_probed, img_oversized) = self.probe_image_sizes(&page.imgs, &final_url).await;
        let psi_score = self.probe_psi(&final_url).await;

        // Pure evaluations over the parsed page.
        let resolved_canonicals: Vec<String> = page
            .canonicals
            .iter()
            .filter_map(|href| resolve_href(&final_url, href))
            .collect();
        let mut directive_sources: Vec<(&str, String)> = page.robots_meta.clone();
        if let Some(header) = x_robots_tag {
            directive_sources.push(("x-robots-tag", header));
        }
        let (noindex, meta_robots) = classify_indexability(&directive_sources);

        let meta_description = page.meta_description.clone().unwrap_or_default();
        let with_alt = page.imgs.iter().filter(|i| i.has_alt()).count();
        let modern = page.imgs.iter().filter(|i| i.is_modern_format()).count();
        let lazy = page.imgs.iter().filter(|i| i.is_lazy()).count();

        let mut checks: Vec<Check> = vec![
            classify_http(fetched_status),
            classify_ttfb(timing_ms),
            classify_opengraph(
                page.og_title.as_deref(),
                page.og_image.as_deref(),
                og_image_loads,
            ),
            classify_favicon(favicon_loads),
            classify_robots(&robots),
            classify_sitemap(&sitemap),
            classify_www(&variant),
            classify_canonical(&resolved_canonicals, &final_url),
            noindex,
            meta_robots,
            classify_meta_description(&meta_description),
            classify_title(&page.title),
            classify_viewport(page.has_viewport),
            classify_img_alt(page.imgs.len(), with_alt),
            classify_img_modern(modern),
            classify_img_size(img_oversized, img_probed),
            classify_img_lazy(lazy),
        ];
        if let Some(score) = psi_score {
            checks.push(classify_psi(score));
        }
        checks.extend(locked_placeholders());

        let score = score_checks(&checks);
        Ok(Report {
            ok: true,
            url: raw.to_string(),
            normalized_url: normalized.to_string(),
            final_url,
            fetched_status,
            timing_ms,
            title: page.title,
            meta_description,
            speed: psi_score,
            score: Some(score),
            checks,
            blocked: None,
            timeout: None,
            cached: None,
            cache_age_ms: None,
            share_blob_path: None,
            share_blob_url: None,
            share_url: None,
            diag: self.take_diag(),
        })
    }
}
