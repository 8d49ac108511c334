//! Snapshot persistence: reports saved to an external blob store and
//! retrievable by path or absolute URL.
//!
//! The store is passed to the HTTP surface as a trait object so the blob
//! backend can be swapped for Redis/disk variants (or the in-memory store
//! used in tests) without touching the core.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use async_trait::async_trait;
use rand::RngCore;
use reqwest::Client;

use crate::models::Report;

/// Location of a persisted snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedSnapshot {
    /// Relative path inside the blob namespace.
    pub path: String,
    /// Absolute URL where the payload can be fetched.
    pub url: String,
}

/// A place reports can be persisted to and loaded from.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persists the report under a fresh random key.
    async fn save(&self, report: &Report) -> Result<SavedSnapshot>;

    /// Loads a snapshot by relative path or absolute URL. `Ok(None)` means
    /// the store answered but has no such snapshot.
    async fn load(&self, path_or_url: &str) -> Result<Option<Report>>;

    /// URLs that [`SnapshotStore::load`] would try for the given reference;
    /// echoed in 404 responses for diagnosis.
    fn candidate_urls(&self, path_or_url: &str) -> Vec<String>;
}

/// Legacy lookup by bare id: tries `<id>.json` then `<id>`, first success
/// wins.
pub async fn load_legacy(store: &dyn SnapshotStore, id: &str) -> Result<Option<Report>> {
    if let Some(report) = store.load(&format!("{id}.json")).await? {
        return Ok(Some(report));
    }
    store.load(id).await
}

fn random_key() -> String {
    let mut bytes = [0_u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Blob-service-backed store: bearer-authenticated writes, public reads.
pub struct BlobSnapshotStore {
    client: Arc<Client>,
    token: String,
    api_base: String,
    public_base: String,
}

impl BlobSnapshotStore {
    /// Creates a store writing through `api_base` and reading from
    /// `public_base`.
    pub fn new(client: Arc<Client>, token: String, api_base: String, public_base: String) -> Self {
        Self {
            client,
            token,
            api_base: api_base.trim_end_matches('/').to_string(),
            public_base: public_base.trim_end_matches('/').to_string(),
        }
    }

    fn public_url(&self, path: &str) -> String {
        format!("{}/{}", self.public_base, path.trim_start_matches('/'))
    }
}

#[async_trait]
impl SnapshotStore for BlobSnapshotStore {
    async fn save(&self, report: &Report) -> Result<SavedSnapshot> {
        let path = format!("audits/{}.json", random_key());
        let body = serde_json::to_vec(report).context("serialize snapshot")?;
        let response = self
            .client
            .put(format!("{}/{}", self.api_base, path))
            .bearer_auth(&self.token)
            .header("x-content-type", "application/json")
            .body(body)
            .send()
            .await
            .context("blob store write")?;
        if !response.status().is_success() {
            anyhow::bail!("blob store write returned HTTP {}", response.status());
        }

        // The write response advertises the public URL; fall back to the
        // configured public base when it does not.
        let url = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|v| v.get("url").and_then(|u| u.as_str()).map(str::to_string))
            .unwrap_or_else(|| self.public_url(&path));
        Ok(SavedSnapshot { path, url })
    }

    async fn load(&self, path_or_url: &str) -> Result<Option<Report>> {
        let url = self
            .candidate_urls(path_or_url)
            .into_iter()
            .next()
            .context("empty snapshot reference")?;
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .context("blob store read")?;
        if response.status().as_u16() == 404 {
            return Ok(None);
        }
        if !response.status().is_success() {
            anyhow::bail!("blob store read returned HTTP {}", response.status());
        }
        let report = response.json::<Report>().await.context("decode snapshot")?;
        Ok(Some(report))
    }

    fn candidate_urls(&self, path_or_url: &str) -> Vec<String> {
        if path_or_url.starts_with("http://") || path_or_url.starts_with("https://") {
            vec![path_or_url.to_string()]
        } else {
            vec![self.public_url(path_or_url)]
        }
    }
}

/// In-memory store used by tests and by deployments without a blob token.
#[derive(Default)]
pub struct MemorySnapshotStore {
    entries: Mutex<HashMap<String, Report>>,
}

#[async_trait]
impl SnapshotStore for MemorySnapshotStore {
    async fn save(&self, report: &Report) -> Result<SavedSnapshot> {
        let path = format!("audits/{}.json", random_key());
        self.entries
            .lock()
            .expect("snapshot lock poisoned")
            .insert(path.clone(), report.clone());
        let url = format!("memory://{path}");
        Ok(SavedSnapshot { path, url })
    }

    async fn load(&self, path_or_url: &str) -> Result<Option<Report>> {
        let key = path_or_url.trim_start_matches("memory://");
        Ok(self
            .entries
            .lock()
            .expect("snapshot lock poisoned")
            .get(key)
            .cloned())
    }

    fn candidate_urls(&self, path_or_url: &str) -> Vec<String> {
        vec![format!("memory://{}", path_or_url.trim_start_matches("memory://"))]
    }
}

/// Composes the shareable widget URL for a stored snapshot path.
pub fn share_url(share_base: &str, path: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(path.as_bytes()).collect();
    format!("{share_base}?blob={encoded}")
}
