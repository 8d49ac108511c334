//! Configuration types and CLI options.

use clap::{Parser, ValueEnum};

use crate::config::constants::{
    BLOB_API_BASE, CACHE_TTL_MS, DEFAULT_PORT, DEFAULT_USER_AGENT, OVERALL_BUDGET_MS,
    PSI_API_BASE, SUB_REQUEST_BUDGET,
};

/// Logging level for the application.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogLevel {
    /// Only error messages
    Error,
    /// Error and warning messages
    Warn,
    /// Error, warning, and informational messages
    Info,
    /// All messages except trace
    Debug,
    /// All messages including trace
    Trace,
}

impl From<LogLevel> for log::LevelFilter {
    fn from(l: LogLevel) -> Self {
        match l {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Log output format: human-readable with colors, or structured JSON.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LogFormat {
    /// Human-readable format with colors (default)
    Plain,
    /// Structured JSON format for machine parsing
    Json,
}

/// Command-line options.
///
/// With `--url` the binary runs a single audit and prints the JSON report;
/// without it, it serves the audit endpoint on `--port`.
#[derive(Debug, Parser)]
#[command(name = "site_audit", about = "Single-shot website audit engine")]
pub struct Opt {
    /// Audit one URL and print the report instead of serving
    #[arg(long)]
    pub url: Option<String>,

    /// Port for the HTTP surface
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Log level
    #[arg(long, value_enum, default_value = "info")]
    pub log_level: LogLevel,

    /// Log format
    #[arg(long, value_enum, default_value = "plain")]
    pub log_format: LogFormat,

    /// Override the overall audit budget in milliseconds
    #[arg(long)]
    pub budget_ms: Option<u64>,

    /// Override the report cache TTL in milliseconds
    #[arg(long)]
    pub cache_ttl_ms: Option<u64>,
}

/// Runtime configuration for the audit engine.
///
/// Built from environment variables by [`AuditConfig::from_env`]; tests
/// construct it directly to point the PSI and blob endpoints at mock servers.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// Overall wall-clock budget per audit in milliseconds
    pub budget_ms: u64,
    /// Discretionary sub-request quota per audit
    pub sub_request_budget: u32,
    /// Report cache TTL in milliseconds
    pub cache_ttl_ms: u64,
    /// PageSpeed Insights API key; the PSI probe is skipped when absent
    pub psi_api_key: Option<String>,
    /// PageSpeed Insights endpoint
    pub psi_api_base: String,
    /// Attach the per-probe `_diag` timing array to responses
    pub debug_audit: bool,
    /// Blob store write token; snapshots are disabled when absent
    pub blob_token: Option<String>,
    /// Public base URL where stored blobs can be fetched
    pub blob_public_base: Option<String>,
    /// Blob store write endpoint
    pub blob_api_base: String,
    /// URL prefix for shareable links (`<base>?blob=<path>`)
    pub share_base: Option<String>,
    /// User-Agent sent on every outbound probe
    pub user_agent: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            budget_ms: OVERALL_BUDGET_MS,
            sub_request_budget: SUB_REQUEST_BUDGET,
            cache_ttl_ms: CACHE_TTL_MS,
            psi_api_key: None,
            psi_api_base: PSI_API_BASE.to_string(),
            debug_audit: false,
            blob_token: None,
            blob_public_base: None,
            blob_api_base: BLOB_API_BASE.to_string(),
            share_base: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl AuditConfig {
    /// Reads configuration from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            budget_ms: env_u64("AUDIT_BUDGET_MS").unwrap_or(defaults.budget_ms),
            cache_ttl_ms: env_u64("AUDIT_CACHE_TTL_MS").unwrap_or(defaults.cache_ttl_ms),
            psi_api_key: env_nonempty("PSI_API_KEY"),
            debug_audit: std::env::var("DEBUG_AUDIT").is_ok_and(|v| v == "1"),
            blob_token: env_nonempty("BLOB_READ_WRITE_TOKEN"),
            blob_public_base: env_nonempty("BLOB_PUBLIC_BASE"),
            share_base: env_nonempty("SHARE_BASE"),
            ..defaults
        }
    }
}

fn env_nonempty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(name: &str) -> Option<u64> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse() {
            Ok(v) => Some(v),
            Err(_) => {
                log::warn!("Ignoring unparseable {name}={raw:?}");
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_converts_to_filter() {
        assert_eq!(
            log::LevelFilter::from(LogLevel::Error),
            log::LevelFilter::Error
        );
        assert_eq!(
            log::LevelFilter::from(LogLevel::Trace),
            log::LevelFilter::Trace
        );
    }

    #[test]
    fn default_config_has_documented_budgets() {
        let config = AuditConfig::default();
        assert_eq!(config.budget_ms, 8_500);
        assert_eq!(config.sub_request_budget, 8);
        assert_eq!(config.cache_ttl_ms, 90_000);
        assert!(config.psi_api_key.is_none());
        assert!(!config.debug_audit);
    }
}
