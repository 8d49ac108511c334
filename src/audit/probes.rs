//! Individual discretionary probes: OG image, favicon, www-variant, image
//! HEADs, and PageSpeed Insights.

use std::time::{Duration, Instant};

use reqwest::Method;
use url::Url;

use crate::checks::VariantOutcome;
use crate::config::{
    ASSET_TIMEOUT_MS, IMAGE_HEADS, MAX_IMAGE_BYTES, PSI_MIN_REMAINING_MS, PSI_TIMEOUT_MS,
    SMALL_TIMEOUT_MS,
};
use crate::extract::ImgTag;
use crate::normalize::{origin_of, resolve_href, www_variant};

use super::AuditRun;

/// Redirect statuses accepted by the www-variant probe.
const REDIRECT_STATUSES: [u16; 4] = [301, 302, 307, 308];

impl AuditRun {
    /// GETs the og:image asset. `None` means the probe never ran (no image,
    /// no quota); `Some(false)` means it ran and the image did not load.
    pub(super) async fn probe_og_image(
        &mut self,
        og_image: Option<&str>,
        final_url: &str,
    ) -> Option<bool> {
        let src = resolve_href(final_url, og_image?)?;
        if !self.budget.spend(1) {
            return None;
        }
        let started = Instant::now();
        let outcome = match self
            .prober
            .fetch(&src, Method::GET, &self.opts(ASSET_TIMEOUT_MS))
            .await
        {
            Ok(response) => Some(response.status().is_success()),
            Err(_) => Some(false),
        };
        self.record("og-image", started);
        outcome
    }

    /// HEAD-then-GETs the favicon (declared icon href, else
    /// `{origin}/favicon.ico`). Free: not counted against the quota.
    pub(super) async fn probe_favicon(
        &mut self,
        icon_href: Option<&str>,
        final_url: &str,
    ) -> Option<bool> {
        if self.budget.expired() {
            return None;
        }
        let url = icon_href
            .and_then(|href| resolve_href(final_url, href))
            .or_else(|| origin_of(final_url).map(|origin| format!("{origin}/favicon.ico")))?;
        let started = Instant::now();
        let outcome = match self
            .prober
            .head_then_get(&url, &self.opts(ASSET_TIMEOUT_MS), true)
            .await
        {
            Ok(response) => Some(response.status().is_success()),
            Err(_) => Some(false),
        };
        self.record("favicon", started);
        outcome
    }

    /// Flips the `www.` prefix and checks for a clean redirect back to the
    /// canonical host.
    pub(super) async fn probe_www_variant(&mut self, final_url: &str) -> VariantOutcome {
        let Some(variant) = www_variant(final_url) else {
            return VariantOutcome::NotApplicable;
        };
        let Some(canonical_host) = Url::parse(final_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
        else {
            return VariantOutcome::NotApplicable;
        };
        let variant_host = match Url::parse(&variant)
            .ok()
            .and_then(|u| u.host_str().map(str::to_string))
        {
            Some(host) => host,
            None => return VariantOutcome::NotApplicable,
        };
        if !self.budget.spend(1) {
            return VariantOutcome::NotApplicable;
        }

        let started = Instant::now();
        let result = self
            .prober
            .fetch(
                &variant,
                Method::GET,
                &self.opts(SMALL_TIMEOUT_MS).manual_redirect(),
            )
            .await;
        self.record("www-variant", started);

        let Ok(response) = result else {
            return VariantOutcome::NotApplicable;
        };
        let status = response.status().as_u16();
        if REDIRECT_STATUSES.contains(&status) {
            let location_host = response
                .headers()
                .get("location")
                .and_then(|v| v.to_str().ok())
                .and_then(|loc| resolve_href(&variant, loc))
                .and_then(|loc| Url::parse(&loc).ok())
                .and_then(|u| u.host_str().map(str::to_ascii_lowercase));
            if location_host.as_deref() == Some(canonical_host.as_str()) {
                return VariantOutcome::Redirects { from: variant_host };
            }
        }
        VariantOutcome::NoRedirect {
            from: variant_host,
            status,
        }
    }

    /// HEADs up to [`IMAGE_HEADS`] page images for oversized payloads.
    /// Returns `(probed, oversized)`.
    pub(super) async fn probe_image_sizes(
        &mut self,
        imgs: &[ImgTag],
        final_url: &str,
    ) -> (usize, usize) {
        let mut probed = 0;
        let mut oversized = 0;
        let candidates = imgs
            .iter()
            .filter_map(|img| img.src.as_deref())
            .filter_map(|src| resolve_href(final_url, src))
            .filter(|u| u.starts_with("http://") || u.starts_with("https://"));

        for candidate in candidates {
            if probed >= IMAGE_HEADS || self.budget.expired() {
                break;
            }
            if !self.budget.spend(1) {
                break;
            }
            let started = Instant::now();
            let result = self
                .prober
                .head_then_get(&candidate, &self.opts(ASSET_TIMEOUT_MS), false)
                .await;
            self.record("img-head", started);
            probed += 1;
            if let Ok(response) = result {
                if response.content_length().unwrap_or(0) > MAX_IMAGE_BYTES {
                    oversized += 1;
                }
            }
        }
        (probed, oversized)
    }

    /// Queries PageSpeed Insights for the performance score (0-100).
    ///
    /// Skipped without an API key, with under 2 s of budget left, or when
    /// the quota is spent; errors omit the check rather than degrade it.
    pub(super) async fn probe_psi(&mut self, final_url: &str) -> Option<u32> {
        let key = self.config.psi_api_key.clone()?;
        if self.budget.time_left() < Duration::from_millis(PSI_MIN_REMAINING_MS) {
            return None;
        }
        if !self.budget.spend(1) {
            return None;
        }

        let encoded: String = url::form_urlencoded::byte_serialize(final_url.as_bytes()).collect();
        let request_url = format!(
            "{}?url={}&category=performance&key={}",
            self.config.psi_api_base, encoded, key
        );
        let started = Instant::now();
        let result = self
            .prober
            .fetch(&request_url, Method::GET, &self.opts(PSI_TIMEOUT_MS))
            .await;
        self.record("psi", started);

        let response = result.ok()?;
        if !response.status().is_success() {
            return None;
        }
        let body: serde_json::Value = response.json().await.ok()?;
        let score = body
            .pointer("/lighthouseResult/categories/performance/score")?
            .as_f64()?;
        Some((score * 100.0).round() as u32)
    }
}
