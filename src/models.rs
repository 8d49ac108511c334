//! Report data model shared by the orchestrator, cache, snapshot store, and
//! HTTP surface.

use serde::{Deserialize, Serialize};

use crate::checks::Check;

/// One classified audit result for a target URL.
///
/// Serialized as camelCase JSON; optional fields are omitted when unset so
/// cached, snapshotted, and fresh payloads stay byte-comparable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    /// Always true for reports; error responses use a different shape.
    pub ok: bool,
    /// The raw user-supplied target.
    pub url: String,
    /// The target after scheme normalization.
    pub normalized_url: String,
    /// The URL the page fetch landed on after redirects.
    pub final_url: String,
    /// HTTP status of the page fetch; 0 on the timeout path.
    pub fetched_status: u16,
    /// Page fetch latency in milliseconds; the full budget on timeout.
    pub timing_ms: u64,
    /// Extracted `<title>` text, empty when unavailable.
    pub title: String,
    /// Extracted meta description, empty when unavailable.
    pub meta_description: String,
    /// PageSpeed Insights performance score (0-100) when probed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<u32>,
    /// Weighted overall score (0-100).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// The findings, exactly one per applicable check id.
    pub checks: Vec<Check>,
    /// Set when the origin refused automated access twice.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocked: Option<bool>,
    /// Set when the page fetch exceeded its deadline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<bool>,
    /// Set when served from the in-process cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached: Option<bool>,
    /// Age of the cached payload in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_age_ms: Option<u64>,
    /// Relative blob path of the persisted snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_blob_path: Option<String>,
    /// Absolute URL of the persisted snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_blob_url: Option<String>,
    /// Shareable widget URL referencing the snapshot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_url: Option<String>,
    /// Per-probe timings, attached only when `DEBUG_AUDIT=1`.
    #[serde(rename = "_diag", skip_serializing_if = "Option::is_none")]
    pub diag: Option<Vec<DiagEntry>>,
}

impl Report {
    /// Looks up a check by id.
    pub fn check(&self, id: &str) -> Option<&Check> {
        self.checks.iter().find(|c| c.id == id)
    }

    /// Whether this report may be cached: blocked and timeout outcomes are
    /// transient origin states and must be re-audited.
    pub fn cacheable(&self) -> bool {
        self.blocked != Some(true) && self.timeout != Some(true)
    }
}

/// One `_diag` entry: how long a probe took.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagEntry {
    /// Probe name, e.g. `page`, `robots`, `psi`.
    pub probe: String,
    /// Elapsed milliseconds.
    pub ms: u64,
}
