//! One-shot HTTP probe primitives.
//!
//! Every outbound request in an audit goes through [`Prober`]: a fetch with
//! a caller-shaped deadline and a distinguishable abort, a HEAD-then-GET
//! fallback for origins that mishandle HEAD, and a bounded retry for
//! transient network failures.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Method, Response};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::config::{apply_browser_profile, apply_default_profile, RETRY_JITTER_MS};

/// Probe failure modes.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The per-request deadline elapsed or the overall budget cancelled us.
    #[error("request aborted after {0} ms")]
    Aborted(u64),

    /// Transport-level failure from the HTTP client.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ProbeError {
    /// Whether retrying could plausibly succeed: aborts and the transient
    /// network family only, never HTTP statuses.
    pub fn retriable(&self) -> bool {
        match self {
            ProbeError::Aborted(_) => true,
            ProbeError::Transport(e) => is_transient(e),
        }
    }
}

/// Classifies a reqwest error as transient (connection reset, DNS failure,
/// unreachable, timeout). Checks the error kind first and falls back to the
/// rendered chain for wrapped io errors.
fn is_transient(error: &reqwest::Error) -> bool {
    if error.is_timeout() || error.is_connect() {
        return true;
    }
    if error.status().is_some() {
        return false;
    }
    let rendered = format!("{error:?}").to_ascii_lowercase();
    ["connection reset", "dns error", "unreachable", "timed out", "broken pipe"]
        .iter()
        .any(|needle| rendered.contains(needle))
}

/// Redirect handling for one probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Follow redirects up to the client's hop limit.
    Follow,
    /// Return the 3xx response as-is.
    Manual,
}

/// Per-probe options.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Redirect mode.
    pub redirect: Redirect,
    /// Per-request deadline, already shaped through the audit budget.
    pub timeout: Duration,
    /// Use the browser header profile instead of the default one.
    pub browser_headers: bool,
    /// Overall-budget token; cancels the request when the audit deadline
    /// elapses.
    pub cancel: CancellationToken,
}

impl FetchOptions {
    /// Options for a probe with the given deadline and budget token.
    pub fn new(timeout: Duration, cancel: CancellationToken) -> Self {
        Self {
            redirect: Redirect::Follow,
            timeout,
            browser_headers: false,
            cancel,
        }
    }

    /// Switches to manual redirect handling.
    pub fn manual_redirect(mut self) -> Self {
        self.redirect = Redirect::Manual;
        self
    }

    /// Switches to the browser header profile.
    pub fn browser(mut self) -> Self {
        self.browser_headers = true;
        self
    }
}

/// Shared probe primitive holding the two prebuilt clients.
#[derive(Debug, Clone)]
pub struct Prober {
    follow: Arc<Client>,
    manual: Arc<Client>,
}

impl Prober {
    /// Builds a prober from the redirect-following and manual-redirect
    /// clients produced at startup.
    pub fn new(follow: Arc<Client>, manual: Arc<Client>) -> Self {
        Self { follow, manual }
    }

    /// Issues one request and returns the response, whatever its status.
    ///
    /// Races the send against both the per-request deadline and the overall
    /// budget token; either losing path surfaces as [`ProbeError::Aborted`].
    pub async fn fetch(
        &self,
        url: &str,
        method: Method,
        opts: &FetchOptions,
    ) -> Result<Response, ProbeError> {
        let client = match opts.redirect {
            Redirect::Follow => &self.follow,
            Redirect::Manual => &self.manual,
        };
        let builder = client.request(method, url);
        let builder = if opts.browser_headers {
            apply_browser_profile(builder)
        } else {
            apply_default_profile(builder)
        };

        let deadline_ms = opts.timeout.as_millis() as u64;
        tokio::select! {
            biased;
            () = opts.cancel.cancelled() => Err(ProbeError::Aborted(deadline_ms)),
            outcome = tokio::time::timeout(opts.timeout, builder.send()) => match outcome {
                Err(_) => Err(ProbeError::Aborted(deadline_ms)),
                Ok(Ok(response)) => Ok(response),
                Ok(Err(e)) => Err(ProbeError::Transport(e)),
            },
        }
    }

    /// HEAD first, falling back to GET when HEAD is unusable.
    ///
    /// The fallback triggers on transport errors, 405/501, and (with
    /// `fallback_on_non_ok`) any non-2xx/3xx status, covering origins that
    /// reject HEAD with a 4xx instead of 405.
    pub async fn head_then_get(
        &self,
        url: &str,
        opts: &FetchOptions,
        fallback_on_non_ok: bool,
    ) -> Result<Response, ProbeError> {
        match self.fetch(url, Method::HEAD, opts).await {
            Ok(response) => {
                let status = response.status();
                let head_unusable = status.as_u16() == 405 || status.as_u16() == 501;
                let non_ok = !(status.is_success() || status.is_redirection());
                if head_unusable || (fallback_on_non_ok && non_ok) {
                    self.fetch(url, Method::GET, opts).await
                } else {
                    Ok(response)
                }
            }
            Err(e @ ProbeError::Aborted(_)) => Err(e),
            Err(ProbeError::Transport(_)) => self.fetch(url, Method::GET, opts).await,
        }
    }
}

/// Retries `op` on abort/transient errors with linear backoff plus jitter.
///
/// The n-th attempt sleeps `base_delay * n + uniform(0..250ms)` beforehand.
/// HTTP status codes never retry; the operation sees the attempt number
/// (1-based) so it can re-shape its own deadline.
pub async fn retry<T, F, Fut>(tries: u32, base_delay: Duration, mut op: F) -> Result<T, ProbeError>
where
    F: FnMut(u32) -> Fut,
    Fut: std::future::Future<Output = Result<T, ProbeError>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < tries && e.retriable() => {
                let jitter = rand::thread_rng().gen_range(0..RETRY_JITTER_MS);
                tokio::time::sleep(base_delay * attempt + Duration::from_millis(jitter)).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};

    fn test_prober() -> Prober {
        let follow = Arc::new(
            Client::builder()
                .user_agent("site_audit-test")
                .build()
                .unwrap(),
        );
        let manual = Arc::new(
            Client::builder()
                .user_agent("site_audit-test")
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .unwrap(),
        );
        Prober::new(follow, manual)
    }

    fn opts(ms: u64) -> FetchOptions {
        FetchOptions::new(Duration::from_millis(ms), CancellationToken::new())
    }

    #[tokio::test]
    async fn fetch_returns_response_for_any_status() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/missing"))
                .respond_with(status_code(404)),
        );
        let prober = test_prober();
        let response = prober
            .fetch(&server.url_str("/missing"), Method::GET, &opts(2_000))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn fetch_aborts_on_deadline() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/slow"))
                .respond_with(delay_and_then(Duration::from_secs(5), status_code(200))),
        );
        let prober = test_prober();
        let err = prober
            .fetch(&server.url_str("/slow"), Method::GET, &opts(100))
            .await
            .unwrap_err();
        assert!(matches!(err, ProbeError::Aborted(_)));
        assert!(err.retriable());
    }

    #[tokio::test]
    async fn fetch_aborts_on_budget_cancellation() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/slow"))
                .times(0..2)
                .respond_with(delay_and_then(Duration::from_secs(5), status_code(200))),
        );
        let prober = test_prober();
        let cancel = CancellationToken::new();
        let options = FetchOptions::new(Duration::from_secs(10), cancel.clone());
        let slow_url = server.url_str("/slow");
        let fetch = prober.fetch(&slow_url, Method::GET, &options);
        cancel.cancel();
        let err = fetch.await.unwrap_err();
        assert!(matches!(err, ProbeError::Aborted(_)));
    }

    #[tokio::test]
    async fn head_falls_back_to_get_on_405() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/page"))
                .respond_with(status_code(405)),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/page"))
                .respond_with(status_code(200)),
        );
        let prober = test_prober();
        let response = prober
            .head_then_get(&server.url_str("/page"), &opts(2_000), false)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn head_keeps_non_ok_without_fallback_flag() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/gone"))
                .respond_with(status_code(404)),
        );
        let prober = test_prober();
        let response = prober
            .head_then_get(&server.url_str("/gone"), &opts(2_000), false)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }

    #[tokio::test]
    async fn head_retries_as_get_with_fallback_flag() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("HEAD", "/fussy"))
                .respond_with(status_code(403)),
        );
        server.expect(
            Expectation::matching(request::method_path("GET", "/fussy"))
                .respond_with(status_code(200)),
        );
        let prober = test_prober();
        let response = prober
            .head_then_get(&server.url_str("/fussy"), &opts(2_000), true)
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn retry_recovers_from_one_abort() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/flaky"))
                .times(2)
                .respond_with(httptest::cycle![
                    delay_and_then(Duration::from_secs(5), status_code(200)),
                    status_code(200),
                ]),
        );
        let prober = test_prober();
        let url = server.url_str("/flaky");
        let response = retry(2, Duration::from_millis(10), |_| {
            let prober = prober.clone();
            let url = url.clone();
            async move { prober.fetch(&url, Method::GET, &opts(300)).await }
        })
        .await
        .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    #[tokio::test]
    async fn retry_does_not_retry_http_statuses() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("GET", "/teapot"))
                .times(1)
                .respond_with(status_code(418)),
        );
        let prober = test_prober();
        let url = server.url_str("/teapot");
        let response = retry(3, Duration::from_millis(10), |_| {
            let prober = prober.clone();
            let url = url.clone();
            async move { prober.fetch(&url, Method::GET, &opts(2_000)).await }
        })
        .await
        .unwrap();
        assert_eq!(response.status().as_u16(), 418);
    }
}
