//! Configuration: CLI options, environment-driven settings, and constants.

pub mod constants;
mod headers;
mod types;

pub use constants::*;
pub(crate) use headers::{apply_browser_profile, apply_default_profile};
pub use types::{AuditConfig, LogFormat, LogLevel, Opt};
