//! HTTP surface tests: ping, CORS, caching, snapshots, and error shapes.

mod helpers;

use httptest::{matchers::*, responders::*, Expectation, Server};
use serde_json::Value;

use helpers::{spawn_app, state_with};
use site_audit::config::AuditConfig;

/// Registers one full audit's worth of origin traffic (page + free probes),
/// with every expectation allowed exactly `audits` hits.
fn expect_audits(server: &Server, html: &'static str, audits: usize) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(audits)
            .respond_with(status_code(200).body(html)),
    );
    server.expect(
        Expectation::matching(request::method_path("HEAD", "/favicon.ico"))
            .times(audits)
            .respond_with(status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/robots.txt"))
            .times(audits)
            .respond_with(status_code(404)),
    );
    for path in [
        "/sitemap.xml",
        "/sitemap_index.xml",
        "/sitemap-index.xml",
        "/wp-sitemap.xml",
    ] {
        server.expect(
            Expectation::matching(request::method_path("HEAD", path))
                .times(audits)
                .respond_with(status_code(404)),
        );
    }
}

#[tokio::test]
async fn get_without_params_pings() {
    let base = spawn_app(state_with(AuditConfig::default())).await;
    let body: Value = reqwest::get(format!("{base}/check"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["ok"], true);
    assert_eq!(body["ping"], "pong");
}

#[tokio::test]
async fn preflight_echoes_cors_headers() {
    let base = spawn_app(state_with(AuditConfig::default())).await;
    let response = reqwest::Client::new()
        .request(reqwest::Method::OPTIONS, format!("{base}/check"))
        .header("origin", "https://widget.example")
        .header("access-control-request-headers", "content-type,x-extra")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 204);
    let headers = response.headers();
    assert_eq!(
        headers.get("access-control-allow-origin").unwrap(),
        "https://widget.example"
    );
    assert_eq!(
        headers.get("access-control-allow-headers").unwrap(),
        "content-type,x-extra"
    );
    assert!(headers
        .get("access-control-allow-methods")
        .unwrap()
        .to_str()
        .unwrap()
        .contains("POST"));
}

#[tokio::test]
async fn invalid_input_yields_400_error_shape() {
    let base = spawn_app(state_with(AuditConfig::default())).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/check"))
        .header("content-type", "application/json")
        .body(r#"{"url": 123}"#)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    assert!(body["errors"].as_array().unwrap()[0]
        .as_str()
        .unwrap()
        .contains("url"));

    let response = client
        .post(format!("{base}/check"))
        .body("not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .get(format!("{base}/check"))
        .query(&[("url", "not a url at all!!!")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn repeat_audits_hit_the_cache_until_nocache() {
    let origin = Server::run();
    // Exactly two origin audits: the first request and the nocache one.
    expect_audits(
        &origin,
        "<html><head><title>Cache Behavior Probe Page</title></head></html>",
        2,
    );
    let target = origin.url_str("/");

    let base = spawn_app(state_with(AuditConfig::default())).await;
    let client = reqwest::Client::new();

    let first: Value = client
        .get(format!("{base}/check"))
        .query(&[("url", target.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(first.get("cached").is_none());

    let second: Value = client
        .get(format!("{base}/check"))
        .query(&[("url", target.as_str())])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["cached"], true);
    assert!(second["cacheAgeMs"].as_u64().is_some());
    assert_eq!(first["checks"], second["checks"], "payload must be identical");

    let third: Value = client
        .get(format!("{base}/check"))
        .query(&[("url", target.as_str()), ("nocache", "1")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(third.get("cached").is_none());
}

#[tokio::test]
async fn blocked_reports_are_never_cached() {
    let origin = Server::run();
    // Two audits, two attempts each (default then browser headers).
    server_block(&origin, 4);
    let target = origin.url_str("/");

    let base = spawn_app(state_with(AuditConfig::default())).await;
    let client = reqwest::Client::new();
    for _ in 0..2 {
        let body: Value = client
            .get(format!("{base}/check"))
            .query(&[("url", target.as_str())])
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["blocked"], true);
        assert!(body.get("cached").is_none());
    }
}

fn server_block(server: &Server, attempts: usize) {
    server.expect(
        Expectation::matching(request::method_path("GET", "/"))
            .times(attempts)
            .respond_with(status_code(403)),
    );
    server.expect(
        Expectation::matching(request::method_path("HEAD", "/favicon.ico"))
            .times(attempts / 2)
            .respond_with(status_code(200)),
    );
    server.expect(
        Expectation::matching(request::method_path("GET", "/robots.txt"))
            .times(attempts / 2)
            .respond_with(status_code(404)),
    );
    for path in [
        "/sitemap.xml",
        "/sitemap_index.xml",
        "/sitemap-index.xml",
        "/wp-sitemap.xml",
    ] {
        server.expect(
            Expectation::matching(request::method_path("HEAD", path))
                .times(attempts / 2)
                .respond_with(status_code(404)),
        );
    }
}

#[tokio::test]
async fn snapshot_mode_persists_and_replays() {
    let origin = Server::run();
    expect_audits(
        &origin,
        "<html><head><title>Snapshot Round Trip Page</title></head></html>",
        1,
    );
    let target = origin.url_str("/");

    let config = AuditConfig {
        share_base: Some("https://widget.example/audit".to_string()),
        ..Default::default()
    };
    let base = spawn_app(state_with(config)).await;
    let client = reqwest::Client::new();

    let saved: Value = client
        .post(format!("{base}/check"))
        .header("content-type", "application/json")
        .body(format!(r#"{{"url": "{target}", "snapshot": true}}"#))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let path = saved["shareBlobPath"].as_str().expect("shareBlobPath");
    assert!(path.starts_with("audits/"));
    assert!(saved["shareBlobUrl"].as_str().is_some());
    let share = saved["shareUrl"].as_str().expect("shareUrl");
    assert!(share.starts_with("https://widget.example/audit?blob="));

    // Replay by blob path.
    let replayed: Value = client
        .get(format!("{base}/check"))
        .query(&[("blob", path)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replayed["fromSnapshot"], true);
    assert_eq!(replayed["title"], "Snapshot Round Trip Page");

    // Legacy replay by bare id (no .json suffix).
    let id = path.trim_end_matches(".json");
    let legacy: Value = client
        .get(format!("{base}/check"))
        .query(&[("id", id)])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(legacy["fromSnapshot"], true);
}

#[tokio::test]
async fn missing_snapshot_yields_404_with_attempts() {
    let base = spawn_app(state_with(AuditConfig::default())).await;
    let response = reqwest::Client::new()
        .get(format!("{base}/check"))
        .query(&[("blob", "audits/does-not-exist.json")])
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["ok"], false);
    let errors = body["errors"].as_array().unwrap();
    assert!(errors.iter().any(|e| e
        .as_str()
        .unwrap()
        .contains("does-not-exist")));
}
