//! Operational constants: budgets, timeout classes, and probe limits.

/// Overall wall-clock budget for one audit in milliseconds.
/// Overridable via `AUDIT_BUDGET_MS`.
pub const OVERALL_BUDGET_MS: u64 = 8_500;

/// Discretionary outbound sub-requests allowed per audit.
/// The main page fetch, robots.txt, sitemap discovery, and favicon are free.
pub const SUB_REQUEST_BUDGET: u32 = 8;

/// Cache TTL for successful reports in milliseconds.
/// Overridable via `AUDIT_CACHE_TTL_MS`.
pub const CACHE_TTL_MS: u64 = 90_000;

// Per-probe timeout classes in milliseconds. Each is floored through
// `AuditBudget::within` so no probe can outlive the overall budget.
/// Main page fetch.
pub const PAGE_TIMEOUT_MS: u64 = 6_000;
/// Asset probes: OG image, favicon, sampled sitemap URLs, image HEADs.
pub const ASSET_TIMEOUT_MS: u64 = 2_000;
/// Small text resources: robots.txt, sitemap discovery, variant probe.
pub const SMALL_TIMEOUT_MS: u64 = 2_500;
/// PageSpeed Insights API call.
pub const PSI_TIMEOUT_MS: u64 = 3_000;
/// Floor applied by `within` so late probes still get a viable deadline.
pub const MIN_PROBE_TIMEOUT_MS: u64 = 150;

/// PSI is skipped entirely when less than this remains of the budget.
pub const PSI_MIN_REMAINING_MS: u64 = 2_000;

/// Sitemap URLs sampled for liveness after `<loc>` extraction.
pub const SITEMAP_SAMPLES: usize = 1;
/// Images HEAD-probed for oversized payloads.
pub const IMAGE_HEADS: usize = 2;
/// Content-length above which an image counts as oversized.
pub const MAX_IMAGE_BYTES: u64 = 300_000;
/// Image tags considered per page.
pub const MAX_IMG_TAGS: usize = 40;
/// JSON-LD script blocks extracted per page.
pub const MAX_JSON_LD_BLOCKS: usize = 5;

/// Maximum accepted target URL length, matching common server limits.
pub const MAX_URL_LENGTH: usize = 2048;

/// Prober retry attempts for abort/transient failures.
pub const RETRY_TRIES: u32 = 2;
/// Base retry delay; the n-th attempt waits `base * n + uniform(0..jitter)`.
pub const RETRY_BASE_DELAY_MS: u64 = 400;
/// Upper bound of the uniform retry jitter.
pub const RETRY_JITTER_MS: u64 = 250;

/// Well-known sitemap locations swept when robots.txt advertises none.
pub const SITEMAP_CANDIDATES: [&str; 4] = [
    "/sitemap.xml",
    "/sitemap_index.xml",
    "/sitemap-index.xml",
    "/wp-sitemap.xml",
];

/// Default User-Agent for all outbound probes. Some origins reject
/// minimal clients outright, so this mimics a current Chrome build.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Default bind port for the HTTP surface.
pub const DEFAULT_PORT: u16 = 8787;

/// PageSpeed Insights endpoint; tests point this at a mock server.
pub const PSI_API_BASE: &str = "https://www.googleapis.com/pagespeedonline/v5/runPagespeed";

/// Blob store write endpoint; tests point this at a mock server.
pub const BLOB_API_BASE: &str = "https://blob.vercel-storage.com";
