//! API error taxonomy.
//!
//! Remote misbehavior (timeouts, blocks, non-2xx targets) is never an error
//! here: it degrades in-band to a report with the matching check statuses.
//! Only invalid input, a missing snapshot, and genuinely unexpected failures
//! produce non-200 responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced to HTTP callers as `{ok:false, errors:[...]}`.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The supplied target was missing or not a usable http(s) URL. 400.
    #[error("invalid url: {0}")]
    InvalidInput(String),

    /// A snapshot lookup failed; carries the attempted URLs for diagnosis. 404.
    #[error("snapshot not found")]
    SnapshotMissing(Vec<String>),

    /// Anything else. 500.
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiError::SnapshotMissing(_) => StatusCode::NOT_FOUND,
            ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error strings for the response body.
    fn messages(&self) -> Vec<String> {
        match self {
            ApiError::SnapshotMissing(attempted) => {
                let mut errors = vec!["snapshot not found".to_string()];
                errors.extend(attempted.iter().map(|u| format!("tried {u}")));
                errors
            }
            other => vec![other.to_string()],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            log::error!("request failed: {self}");
        }
        (status, Json(json!({ "ok": false, "errors": self.messages() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ApiError::InvalidInput("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::SnapshotMissing(vec![]).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unexpected(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn snapshot_missing_echoes_attempted_urls() {
        let err = ApiError::SnapshotMissing(vec![
            "https://blob.example/a.json".to_string(),
            "https://blob.example/a".to_string(),
        ]);
        let messages = err.messages();
        assert_eq!(messages.len(), 3);
        assert!(messages[1].contains("a.json"));
    }
}
