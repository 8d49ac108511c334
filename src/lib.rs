//! site_audit library: single-shot website audit engine.
//!
//! Given a target URL, the engine issues a bounded set of outbound HTTP
//! probes under a strict wall-clock budget and sub-request quota, parses the
//! landing HTML, classifies the outcomes into pass/warn/fail/locked
//! findings, and produces a weighted overall score. Origins that block or
//! stall degrade gracefully to partial reports instead of errors.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use site_audit::audit::Auditor;
//! use site_audit::config::AuditConfig;
//! use site_audit::initialization::{init_client, init_manual_redirect_client};
//! use site_audit::probe::Prober;
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Arc::new(AuditConfig::default());
//! let prober = Prober::new(
//!     init_client(&config.user_agent)?,
//!     init_manual_redirect_client(&config.user_agent)?,
//! );
//! let report = Auditor::new(prober, config).run("example.com").await?;
//! println!("score: {:?}", report.score);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

pub mod audit;
pub mod budget;
pub mod cache;
pub mod checks;
pub mod config;
pub mod error_handling;
pub mod extract;
pub mod initialization;
pub mod models;
pub mod normalize;
pub mod probe;
pub mod score;
pub mod server;
pub mod snapshot;

pub use audit::Auditor;
pub use cache::AuditCache;
pub use config::AuditConfig;
pub use error_handling::ApiError;
pub use models::{DiagEntry, Report};
pub use server::{router, serve, AppState};
