//! HTTP surface: the `/check` endpoint.

mod handlers;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::routing::get;
use axum::Router;

use crate::audit::Auditor;
use crate::cache::AuditCache;
use crate::config::AuditConfig;
use crate::snapshot::SnapshotStore;

use handlers::{check_get, check_post, check_preflight};

/// Shared state behind the `/check` routes.
#[derive(Clone)]
pub struct AppState {
    /// The audit engine.
    pub auditor: Auditor,
    /// In-process report cache.
    pub cache: Arc<AuditCache>,
    /// Snapshot persistence, when configured.
    pub store: Option<Arc<dyn SnapshotStore>>,
    /// Runtime configuration.
    pub config: Arc<AuditConfig>,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/check",
            get(check_get).post(check_post).options(check_preflight),
        )
        .with_state(state)
}

/// Binds the listener and serves until ctrl-c.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("failed to bind port {port}"))?;
    log::info!("audit endpoint listening on http://0.0.0.0:{port}/check");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("shutting down");
        })
        .await
        .context("server error")?;
    Ok(())
}
