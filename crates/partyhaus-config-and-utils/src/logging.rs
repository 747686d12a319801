//! Logging initialization.
//!
//! Thin wrapper over the observability package: every PartyHaus process
//! writes structured JSONL to `~/.partyhaus/logs/dev.jsonl` and mirrors it to
//! stderr.

use crate::Paths;
use observability::LogConfig;

/// Initialize logging for the CLI process, writing JSONL under
/// `paths.logs_dir()`.
///
/// The level is the default filter; `RUST_LOG` still takes precedence.
///
/// ```ignore
/// init_logging("info", &paths);
/// tracing::info!("partyhaus started");
/// ```
pub fn init_logging(level: &str, paths: &Paths) {
    init_logging_for_service("partyhaus", level, paths);
}

/// Initialize logging with a custom service name, e.g. `webhook` for the
/// long-running server so its lines can be filtered in the shared file.
pub fn init_logging_for_service(service_name: &str, level: &str, paths: &Paths) {
    observability::init_with_config(
        LogConfig::for_service(service_name)
            .with_level(parse_level(level).to_string().to_lowercase())
            .with_log_path(paths.dev_log_file())
            .with_stderr(true),
    );
}

/// Parse a log level string into a tracing Level. Unknown values map to INFO.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.trim().to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
