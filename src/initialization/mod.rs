//! Startup wiring: logger and HTTP clients.

mod client;
mod logger;

pub use client::{init_client, init_manual_redirect_client};
pub use logger::init_logger_with;
