//! Findings: the `Check` sum type, the closed id set, and the locked
//! placeholder list.

mod classify;

pub use classify::*;

use serde::{Deserialize, Serialize};

/// Outcome of one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    /// The check passed its thresholds.
    Pass,
    /// Degraded, borderline, or unverifiable.
    Warn,
    /// The check failed its thresholds.
    Fail,
    /// Placeholder for a deferred computation.
    Locked,
}

/// A check's measured value, when one exists.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CheckValue {
    /// Numeric measurement (length, ratio, score, status code).
    Number(f64),
    /// Boolean measurement.
    Bool(bool),
}

/// One classified probe outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Check {
    /// Identifier from the closed check-id set.
    pub id: String,
    /// Human-readable label.
    pub label: String,
    /// Classified status.
    pub status: CheckStatus,
    /// Free-form explanation of the outcome.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Measured value backing the status, when meaningful.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<CheckValue>,
    /// Set on locked placeholders.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
}

impl Check {
    /// A passing check.
    pub fn pass(id: &str, details: impl Into<String>) -> Self {
        Self::with_status(id, CheckStatus::Pass, details)
    }

    /// A warning check.
    pub fn warn(id: &str, details: impl Into<String>) -> Self {
        Self::with_status(id, CheckStatus::Warn, details)
    }

    /// A failing check.
    pub fn fail(id: &str, details: impl Into<String>) -> Self {
        Self::with_status(id, CheckStatus::Fail, details)
    }

    /// A locked placeholder for a deferred check.
    pub fn locked_placeholder(id: &str) -> Self {
        Self {
            id: id.to_string(),
            label: label_for(id).to_string(),
            status: CheckStatus::Locked,
            details: None,
            value: None,
            locked: Some(true),
        }
    }

    fn with_status(id: &str, status: CheckStatus, details: impl Into<String>) -> Self {
        Self {
            id: id.to_string(),
            label: label_for(id).to_string(),
            status,
            details: Some(details.into()),
            value: None,
            locked: None,
        }
    }

    /// Attaches a numeric value.
    pub fn with_number(mut self, value: f64) -> Self {
        self.value = Some(CheckValue::Number(value));
        self
    }

    /// Attaches a boolean value.
    pub fn with_bool(mut self, value: bool) -> Self {
        self.value = Some(CheckValue::Bool(value));
        self
    }

    /// Whether this check failed.
    pub fn failed(&self) -> bool {
        self.status == CheckStatus::Fail
    }

    /// Whether this check is a locked placeholder.
    pub fn is_locked(&self) -> bool {
        self.status == CheckStatus::Locked || self.locked == Some(true)
    }
}

/// Check ids whose computation is deferred; every report carries them as
/// locked placeholders.
pub const LOCKED_CHECK_IDS: [&str; 7] = [
    "mixed-content",
    "security-headers",
    "https-redirect",
    "compression",
    "structured-data",
    "h1-structure",
    "llms",
];

/// The locked placeholder findings, in stable order.
pub fn locked_placeholders() -> Vec<Check> {
    LOCKED_CHECK_IDS
        .iter()
        .map(|id| Check::locked_placeholder(id))
        .collect()
}

/// Human label for a check id.
pub fn label_for(id: &str) -> &'static str {
    match id {
        "http" => "HTTP status",
        "ttfb" => "Response time",
        "opengraph" => "Open Graph tags",
        "favicon" => "Favicon",
        "robots" => "Robots.txt",
        "sitemap" => "Sitemap",
        "www-canonical" => "WWW redirect",
        "canonical" => "Canonical tag",
        "noindex" => "Indexability",
        "meta-robots" => "Robots directives",
        "meta-description" => "Meta description",
        "title-length" => "Title length",
        "viewport" => "Mobile viewport",
        "img-alt" => "Image alt text",
        "img-modern" => "Modern image formats",
        "img-size" => "Image sizes",
        "img-lazy" => "Lazy-loaded images",
        "psi" => "PageSpeed score",
        "blocked" => "Access blocked",
        "timeout" => "Audit timed out",
        "mixed-content" => "Mixed content",
        "security-headers" => "Security headers",
        "https-redirect" => "HTTPS redirect",
        "compression" => "Compression",
        "structured-data" => "Structured data",
        "h1-structure" => "Heading structure",
        "llms" => "LLMs.txt",
        _ => "Check",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let check = Check::pass("viewport", "present");
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "pass");
        assert_eq!(json["label"], "Mobile viewport");
        assert!(json.get("locked").is_none());
    }

    #[test]
    fn locked_placeholder_carries_flag() {
        let check = Check::locked_placeholder("compression");
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "locked");
        assert_eq!(json["locked"], true);
    }

    #[test]
    fn value_serializes_untagged() {
        let number = Check::pass("title-length", "ok").with_number(42.0);
        assert_eq!(serde_json::to_value(&number).unwrap()["value"], 42.0);
        let boolean = Check::pass("favicon", "ok").with_bool(true);
        assert_eq!(serde_json::to_value(&boolean).unwrap()["value"], true);
    }

    #[test]
    fn placeholder_set_is_complete() {
        let ids: Vec<_> = locked_placeholders().into_iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), 7);
        assert!(ids.contains(&"h1-structure".to_string()));
        assert!(ids.contains(&"llms".to_string()));
    }
}
