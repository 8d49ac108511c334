//! In-process report cache.
//!
//! Advisory map from canonical URL key to a recent report. Entries are
//! evicted lazily on read once past their TTL; there is no LRU bound.
//! Blocked and timeout reports are never stored — those origin states are
//! transient and must be re-audited.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::models::Report;

#[derive(Debug, Clone)]
struct CacheEntry {
    payload: Report,
    created_at: Instant,
    expires_at: Instant,
}

/// TTL-bounded report cache keyed by canonical URL.
#[derive(Debug)]
pub struct AuditCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl AuditCache {
    /// Creates a cache with the given TTL.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached report and its age in milliseconds, evicting the
    /// entry first when it has expired.
    pub fn get(&self, key: &str) -> Option<(Report, u64)> {
        let mut entries = self.entries.lock().expect("cache lock poisoned");
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => {
                let age_ms = entry.created_at.elapsed().as_millis() as u64;
                Some((entry.payload.clone(), age_ms))
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    /// Stores a report. Callers must already have established that the
    /// report is cacheable (`Report::cacheable`) and that the audit was not
    /// a snapshot run.
    pub fn set(&self, key: &str, payload: Report) {
        debug_assert!(payload.cacheable());
        let now = Instant::now();
        let entry = CacheEntry {
            payload,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), entry);
    }

    /// Number of live-or-expired entries currently held.
    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().expect("cache lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report_for(url: &str) -> Report {
        Report {
            ok: true,
            url: url.to_string(),
            normalized_url: url.to_string(),
            final_url: url.to_string(),
            fetched_status: 200,
            timing_ms: 120,
            title: "T".into(),
            meta_description: String::new(),
            speed: None,
            score: Some(90),
            checks: vec![],
            blocked: None,
            timeout: None,
            cached: None,
            cache_age_ms: None,
            share_blob_path: None,
            share_blob_url: None,
            share_url: None,
            diag: None,
        }
    }

    #[test]
    fn round_trips_within_ttl() {
        let cache = AuditCache::new(Duration::from_secs(60));
        cache.set("https://example.com", report_for("https://example.com"));
        let (hit, age_ms) = cache.get("https://example.com").unwrap();
        assert_eq!(hit.url, "https://example.com");
        assert!(age_ms < 1_000);
    }

    #[test]
    fn expired_entries_are_evicted_on_read() {
        let cache = AuditCache::new(Duration::from_millis(0));
        cache.set("k", report_for("https://example.com"));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("k").is_none());
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn misses_return_none() {
        let cache = AuditCache::new(Duration::from_secs(60));
        assert!(cache.get("absent").is_none());
    }

    #[test]
    fn writers_overwrite() {
        let cache = AuditCache::new(Duration::from_secs(60));
        cache.set("k", report_for("https://a.example"));
        cache.set("k", report_for("https://b.example"));
        assert_eq!(cache.get("k").unwrap().0.url, "https://b.example");
        assert_eq!(cache.len(), 1);
    }
}
