// Shared test helpers: auditor/state construction against mock origins.

use std::sync::Arc;
use std::time::Duration;

use site_audit::audit::Auditor;
use site_audit::cache::AuditCache;
use site_audit::config::AuditConfig;
use site_audit::initialization::{init_client, init_manual_redirect_client};
use site_audit::probe::Prober;
use site_audit::server::AppState;
use site_audit::snapshot::{MemorySnapshotStore, SnapshotStore};

/// Builds an auditor over the given configuration.
#[allow(dead_code)] // Used by other test files
pub fn auditor_with(config: AuditConfig) -> Auditor {
    let config = Arc::new(config);
    let follow = init_client(&config.user_agent).expect("client");
    let manual = init_manual_redirect_client(&config.user_agent).expect("manual client");
    Auditor::new(Prober::new(follow, manual), config)
}

/// Builds full app state with an in-memory snapshot store.
#[allow(dead_code)]
pub fn state_with(config: AuditConfig) -> AppState {
    let config = Arc::new(config);
    let follow = init_client(&config.user_agent).expect("client");
    let manual = init_manual_redirect_client(&config.user_agent).expect("manual client");
    let auditor = Auditor::new(Prober::new(follow, manual), Arc::clone(&config));
    let store: Option<Arc<dyn SnapshotStore>> = Some(Arc::new(MemorySnapshotStore::default()));
    AppState {
        auditor,
        cache: Arc::new(AuditCache::new(Duration::from_millis(config.cache_ttl_ms))),
        store,
        config,
    }
}

/// Serves the app on an ephemeral port, returning its base URL.
#[allow(dead_code)]
pub async fn spawn_app(state: AppState) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, site_audit::router(state))
            .await
            .expect("test server");
    });
    format!("http://{addr}")
}
