//! `/check` request handlers: CORS preflight, ping, audit, and snapshot
//! retrieval.

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error_handling::ApiError;
use crate::models::Report;
use crate::normalize::{normalize_key, normalize_target};
use crate::snapshot::{load_legacy, share_url};

use super::AppState;

/// Query parameters accepted by `GET /check`.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CheckParams {
    url: Option<String>,
    nocache: Option<String>,
    blob: Option<String>,
    id: Option<String>,
}

fn flag(raw: &Option<String>) -> bool {
    matches!(raw.as_deref(), Some("1") | Some("true"))
}

/// Adds CORS headers echoed from the inbound request.
fn with_cors(request_headers: &HeaderMap, mut response: Response) -> Response {
    let headers = response.headers_mut();
    let origin = request_headers
        .get(header::ORIGIN)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("*"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin);
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    let allow_headers = request_headers
        .get(header::ACCESS_CONTROL_REQUEST_HEADERS)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("content-type"));
    headers.insert(header::ACCESS_CONTROL_ALLOW_HEADERS, allow_headers);
    headers.insert(
        header::ACCESS_CONTROL_MAX_AGE,
        HeaderValue::from_static("86400"),
    );
    response
}

/// `OPTIONS /check`: 204 with CORS headers.
pub(super) async fn check_preflight(headers: HeaderMap) -> Response {
    with_cors(&headers, StatusCode::NO_CONTENT.into_response())
}

/// `GET /check`: ping without parameters, snapshot retrieval with
/// `blob`/`id`, audit with `url`.
pub(super) async fn check_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<CheckParams>,
) -> Response {
    let outcome = if params.blob.is_some() || params.id.is_some() {
        snapshot_flow(&state, params.blob.as_deref(), params.id.as_deref()).await
    } else if let Some(url) = params.url.as_deref() {
        audit_flow(&state, url, flag(&params.nocache), false).await
    } else {
        Ok(json!({ "ok": true, "ping": "pong" }))
    };
    respond(&headers, outcome)
}

/// `POST /check`: audit with JSON body `{url, nocache?, snapshot?}`.
pub(super) async fn check_post(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Response {
    let outcome = match parse_post_body(&body) {
        Ok((url, nocache, snapshot)) => audit_flow(&state, &url, nocache, snapshot).await,
        Err(e) => Err(e),
    };
    respond(&headers, outcome)
}

fn parse_post_body(body: &str) -> Result<(String, bool, bool), ApiError> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| ApiError::InvalidInput("body must be JSON".to_string()))?;
    let url = value
        .get("url")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::InvalidInput("url must be a string".to_string()))?
        .to_string();
    let nocache = value.get("nocache").and_then(Value::as_bool).unwrap_or(false);
    let snapshot = value.get("snapshot").and_then(Value::as_bool).unwrap_or(false);
    Ok((url, nocache, snapshot))
}

fn respond(headers: &HeaderMap, outcome: Result<Value, ApiError>) -> Response {
    let response = match outcome {
        Ok(value) => Json(value).into_response(),
        Err(e) => e.into_response(),
    };
    with_cors(headers, response)
}

/// Runs (or replays) an audit. Snapshot mode bypasses the cache entirely.
async fn audit_flow(
    state: &AppState,
    url: &str,
    nocache: bool,
    snapshot: bool,
) -> Result<Value, ApiError> {
    let normalized = normalize_target(url)?;
    let key = normalize_key(&normalized);

    if !snapshot && !nocache {
        if let Some((mut cached, age_ms)) = state.cache.get(&key) {
            log::debug!("cache hit for {key} (age {age_ms} ms)");
            cached.cached = Some(true);
            cached.cache_age_ms = Some(age_ms);
            return to_value(cached);
        }
    }

    let mut report = state.auditor.run(url).await?;

    if snapshot {
        let store = state.store.as_ref().ok_or_else(|| {
            ApiError::Unexpected(anyhow::anyhow!("snapshot store is not configured"))
        })?;
        let saved = store.save(&report).await.map_err(ApiError::Unexpected)?;
        report.share_url = state
            .config
            .share_base
            .as_deref()
            .map(|base| share_url(base, &saved.path));
        report.share_blob_path = Some(saved.path);
        report.share_blob_url = Some(saved.url);
    } else if report.cacheable() {
        state.cache.set(&key, report.clone());
    }
    to_value(report)
}

/// Loads a snapshot by blob reference or legacy bare id.
async fn snapshot_flow(
    state: &AppState,
    blob: Option<&str>,
    id: Option<&str>,
) -> Result<Value, ApiError> {
    let reference = blob.or(id).unwrap_or_default().to_string();
    let Some(store) = state.store.as_ref() else {
        return Err(ApiError::SnapshotMissing(vec![reference]));
    };

    let loaded = match (blob, id) {
        (Some(reference), _) => store.load(reference).await,
        (None, Some(id)) => load_legacy(store.as_ref(), id).await,
        (None, None) => Ok(None),
    }
    .unwrap_or_else(|e| {
        log::warn!("snapshot load failed for {reference}: {e:#}");
        None
    });

    match loaded {
        Some(report) => {
            let mut value = to_value(report)?;
            value["fromSnapshot"] = Value::Bool(true);
            Ok(value)
        }
        None => {
            let mut attempted = Vec::new();
            if let Some(reference) = blob {
                attempted.extend(store.candidate_urls(reference));
            }
            if let Some(id) = id {
                attempted.extend(store.candidate_urls(&format!("{id}.json")));
                attempted.extend(store.candidate_urls(id));
            }
            Err(ApiError::SnapshotMissing(attempted))
        }
    }
}

fn to_value(report: Report) -> Result<Value, ApiError> {
    serde_json::to_value(report)
        .map_err(|e| ApiError::Unexpected(anyhow::Error::new(e).context("serialize report")))
}
