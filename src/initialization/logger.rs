//! Logger initialization.

use std::io::Write;

use colored::Colorize;
use log::LevelFilter;

use crate::config::LogFormat;

/// Initializes `env_logger` with the given level and format.
///
/// `RUST_LOG` is honored as a baseline; the explicit level overrides it.
/// Noisy transitive crates are pinned down so probe traffic stays readable.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(level);
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("site_audit", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    serde_json::json!({
                        "ts": chrono::Utc::now().to_rfc3339(),
                        "level": record.level().to_string(),
                        "target": record.target(),
                        "message": record.args().to_string(),
                    })
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = match record.level() {
                    log::Level::Error => "ERROR".red().bold(),
                    log::Level::Warn => "WARN ".yellow().bold(),
                    log::Level::Info => "INFO ".green(),
                    log::Level::Debug => "DEBUG".blue(),
                    log::Level::Trace => "TRACE".dimmed(),
                };
                writeln!(buf, "{} {} {}", level, record.target().dimmed(), record.args())
            });
        }
    }

    // try_init so tests calling this twice don't panic
    let _ = builder.try_init();
}
