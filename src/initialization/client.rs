//! HTTP client initialization.
//!
//! Two clients are built at startup and shared across audits: one that
//! follows redirects (page, asset, and sampling probes) and one with
//! redirects disabled so the www-variant probe can inspect the Location
//! header itself. Per-request deadlines come from the audit budget, so the
//! clients carry only a connect timeout.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{redirect, Client, ClientBuilder};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const MAX_REDIRECT_HOPS: usize = 10;

/// Builds the redirect-following client.
pub fn init_client(user_agent: &str) -> Result<Arc<Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .user_agent(user_agent)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(redirect::Policy::limited(MAX_REDIRECT_HOPS))
        .build()?;
    Ok(Arc::new(client))
}

/// Builds the manual-redirect client.
pub fn init_manual_redirect_client(user_agent: &str) -> Result<Arc<Client>, reqwest::Error> {
    let client = ClientBuilder::new()
        .user_agent(user_agent)
        .connect_timeout(CONNECT_TIMEOUT)
        .redirect(redirect::Policy::none())
        .build()?;
    Ok(Arc::new(client))
}
