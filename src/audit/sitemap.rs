//! robots.txt and sitemap probes.

use std::collections::HashSet;
use std::time::Instant;

use futures::future::join_all;
use reqwest::Method;

use crate::checks::{RobotsOutcome, SitemapOutcome};
use crate::config::{
    ASSET_TIMEOUT_MS, PAGE_TIMEOUT_MS, SITEMAP_CANDIDATES, SITEMAP_SAMPLES, SMALL_TIMEOUT_MS,
};
use crate::extract::locs;
use crate::normalize::resolve_href;

use super::AuditRun;

/// Parses robots.txt: whether the `*` agent group disallows everything, and
/// any advertised sitemap URLs.
fn parse_robots(text: &str) -> (bool, Vec<String>) {
    let mut disallow_all = false;
    let mut sitemaps = Vec::new();
    let mut group_is_star = false;
    let mut last_was_agent = false;

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();
        match key.as_str() {
            "user-agent" => {
                // A user-agent line after directives starts a new group.
                if !last_was_agent {
                    group_is_star = false;
                }
                if value == "*" {
                    group_is_star = true;
                }
                last_was_agent = true;
            }
            "disallow" => {
                if group_is_star && value == "/" {
                    disallow_all = true;
                }
                last_was_agent = false;
            }
            "sitemap" => {
                sitemaps.push(value.to_string());
                last_was_agent = false;
            }
            _ => last_was_agent = false,
        }
    }
    (disallow_all, sitemaps)
}

impl AuditRun {
    /// GETs `{origin}/robots.txt`. Free: not counted against the quota.
    pub(super) async fn probe_robots(&mut self, origin: &str) -> RobotsOutcome {
        if self.budget.expired() {
            return RobotsOutcome::default();
        }
        let url = format!("{origin}/robots.txt");
        let started = Instant::now();
        let result = self
            .prober
            .fetch(&url, Method::GET, &self.opts(SMALL_TIMEOUT_MS))
            .await;
        let outcome = match result {
            Ok(response) if response.status().is_success() => {
                match tokio::time::timeout(self.budget.within(SMALL_TIMEOUT_MS), response.text())
                    .await
                {
                    Ok(Ok(text)) => {
                        let (disallow_all, sitemaps) = parse_robots(&text);
                        RobotsOutcome {
                            exists: true,
                            disallow_all,
                            sitemaps,
                        }
                    }
                    _ => RobotsOutcome {
                        exists: true,
                        ..Default::default()
                    },
                }
            }
            _ => RobotsOutcome::default(),
        };
        self.record("robots", started);
        outcome
    }

    /// Discovers the sitemap and, when `verify` is set, parses it and
    /// samples a listed URL. Discovery (robots-advertised locations first,
    /// then the well-known paths) is free; only URL samples spend quota.
    pub(super) async fn probe_sitemap(
        &mut self,
        origin: &str,
        advertised: &[String],
        verify: bool,
    ) -> SitemapOutcome {
        let mut candidates: Vec<String> = Vec::new();
        let mut seen = HashSet::new();
        for advertised_url in advertised {
            if let Some(resolved) = resolve_href(origin, advertised_url) {
                if seen.insert(resolved.clone()) {
                    candidates.push(resolved);
                }
            }
        }
        for path in SITEMAP_CANDIDATES {
            let candidate = format!("{origin}{path}");
            if seen.insert(candidate.clone()) {
                candidates.push(candidate);
            }
        }

        let started = Instant::now();
        let mut discovered: Option<(String, bool)> = None;
        for candidate in candidates {
            if self.budget.expired() {
                break;
            }
            let Ok(response) = self
                .prober
                .head_then_get(&candidate, &self.opts(SMALL_TIMEOUT_MS), false)
                .await
            else {
                continue;
            };
            if !response.status().is_success() {
                continue;
            }
            let gzipped = candidate.ends_with(".gz")
                || response
                    .headers()
                    .get("content-type")
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|ct| ct.contains("gzip"));
            discovered = Some((candidate, gzipped));
            break;
        }
        self.record("sitemap-discovery", started);

        let Some((url, gzipped)) = discovered else {
            return SitemapOutcome::Missing;
        };
        if gzipped {
            return SitemapOutcome::Gzipped { url };
        }
        if !verify {
            return SitemapOutcome::Unverified {
                url,
                reason: "found; contents not verified".to_string(),
            };
        }
        self.verify_sitemap(url).await
    }

    /// Fetches the sitemap XML, extracts `<loc>` entries, and samples the
    /// first [`SITEMAP_SAMPLES`] of them in parallel.
    async fn verify_sitemap(&mut self, url: String) -> SitemapOutcome {
        let started = Instant::now();
        let body = match self
            .prober
            .fetch(&url, Method::GET, &self.opts(PAGE_TIMEOUT_MS))
            .await
        {
            Ok(response) if response.status().is_success() => {
                match tokio::time::timeout(self.budget.within(PAGE_TIMEOUT_MS), response.text())
                    .await
                {
                    Ok(Ok(text)) => text,
                    _ => {
                        self.record("sitemap-fetch", started);
                        return SitemapOutcome::Unverified {
                            url,
                            reason: "sitemap body could not be read".to_string(),
                        };
                    }
                }
            }
            _ => {
                self.record("sitemap-fetch", started);
                return SitemapOutcome::Unverified {
                    url,
                    reason: "sitemap could not be fetched".to_string(),
                };
            }
        };
        self.record("sitemap-fetch", started);

        let entries = locs(&body);
        if entries.is_empty() {
            return SitemapOutcome::Unverified {
                url,
                reason: "no <loc> entries found".to_string(),
            };
        }

        let mut samples = Vec::new();
        for loc in entries.iter().take(SITEMAP_SAMPLES) {
            if !self.budget.spend(1) {
                break;
            }
            samples.push(loc.clone());
        }
        if samples.is_empty() {
            return SitemapOutcome::Unverified {
                url,
                reason: "listed URLs not sampled (sub-request quota exhausted)".to_string(),
            };
        }

        let started = Instant::now();
        let probes = samples.iter().map(|sample| {
            let prober = self.prober.clone();
            let opts = self.opts(ASSET_TIMEOUT_MS);
            let sample = sample.clone();
            async move {
                match prober.head_then_get(&sample, &opts, true).await {
                    Ok(response) => {
                        response.status().is_success() || response.status().is_redirection()
                    }
                    Err(_) => false,
                }
            }
        });
        let results = join_all(probes).await;
        self.record("sitemap-sample", started);

        if results.into_iter().any(|ok| ok) {
            SitemapOutcome::Verified {
                url,
                locs: entries.len(),
            }
        } else {
            SitemapOutcome::Unverified {
                url,
                reason: "sampled URL did not respond OK".to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_robots;

    #[test]
    fn detects_blanket_disallow_for_star() {
        let (disallow_all, _) = parse_robots("User-agent: *\nDisallow: /\n");
        assert!(disallow_all);
    }

    #[test]
    fn partial_disallow_is_not_blanket() {
        let (disallow_all, _) = parse_robots("User-agent: *\nDisallow: /admin\n");
        assert!(!disallow_all);
    }

    #[test]
    fn star_scoping_respects_groups() {
        // The blanket disallow applies to a specific bot, not `*`.
        let text = "User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nDisallow:\n";
        let (disallow_all, _) = parse_robots(text);
        assert!(!disallow_all);
    }

    #[test]
    fn stacked_agents_share_a_group() {
        let text = "User-agent: BadBot\nUser-agent: *\nDisallow: /\n";
        let (disallow_all, _) = parse_robots(text);
        assert!(disallow_all);
    }

    #[test]
    fn collects_sitemap_lines_with_schemes_intact() {
        let text = "Sitemap: https://example.com/sitemap.xml\nUser-agent: *\nDisallow:\n";
        let (_, sitemaps) = parse_robots(text);
        assert_eq!(sitemaps, vec!["https://example.com/sitemap.xml"]);
    }

    #[test]
    fn ignores_comments_and_noise() {
        let text = "# full block\nUser-agent: * # everyone\nDisallow: / # root\n";
        let (disallow_all, _) = parse_robots(text);
        assert!(disallow_all);
    }
}
