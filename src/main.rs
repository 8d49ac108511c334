use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use site_audit::audit::Auditor;
use site_audit::cache::AuditCache;
use site_audit::config::{AuditConfig, Opt};
use site_audit::initialization::{init_client, init_manual_redirect_client, init_logger_with};
use site_audit::probe::Prober;
use site_audit::server::{serve, AppState};
use site_audit::snapshot::{BlobSnapshotStore, SnapshotStore};

#[tokio::main]
async fn main() -> Result<()> {
    let opt = Opt::parse();
    init_logger_with(opt.log_level.into(), opt.log_format);

    let mut config = AuditConfig::from_env();
    if let Some(budget_ms) = opt.budget_ms {
        config.budget_ms = budget_ms;
    }
    if let Some(cache_ttl_ms) = opt.cache_ttl_ms {
        config.cache_ttl_ms = cache_ttl_ms;
    }
    let config = Arc::new(config);

    let follow = init_client(&config.user_agent).context("failed to build HTTP client")?;
    let manual = init_manual_redirect_client(&config.user_agent)
        .context("failed to build manual-redirect HTTP client")?;
    let prober = Prober::new(Arc::clone(&follow), manual);
    let auditor = Auditor::new(prober, Arc::clone(&config));

    // One-shot mode: audit a single URL and print the report.
    if let Some(url) = opt.url {
        let report = auditor.run(&url).await?;
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let cache = Arc::new(AuditCache::new(Duration::from_millis(config.cache_ttl_ms)));
    let store: Option<Arc<dyn SnapshotStore>> =
        match (&config.blob_token, &config.blob_public_base) {
            (Some(token), Some(public_base)) => Some(Arc::new(BlobSnapshotStore::new(
                Arc::clone(&follow),
                token.clone(),
                config.blob_api_base.clone(),
                public_base.clone(),
            ))),
            _ => {
                log::info!("snapshot store disabled (no BLOB_READ_WRITE_TOKEN/BLOB_PUBLIC_BASE)");
                None
            }
        };

    serve(
        AppState {
            auditor,
            cache,
            store,
            config,
        },
        opt.port,
    )
    .await
}
