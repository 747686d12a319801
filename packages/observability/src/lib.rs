//! # Observability
//!
//! Structured logging for PartyHaus processes.
//!
//! A process installs the subscriber once through [`init_with_config`] and
//! then only uses `tracing` macros. With the `dev` feature (default) every
//! record becomes one JSON line in a shared file, `~/.partyhaus/logs/dev.jsonl`
//! unless a path is given:
//!
//! ```text
//! tail -f ~/.partyhaus/logs/dev.jsonl | jq 'select(.service == "webhook")'
//! ```
//!
//! Lines are flushed one at a time, so the webhook server and CLI
//! invocations can append to the same file.
//!
//! ```rust,ignore
//! observability::init_with_config(
//!     observability::LogConfig::for_service("webhook")
//!         .with_level("debug")
//!         .with_stderr(true),
//! );
//! tracing::info!(addr = %addr, "listening");
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;

use std::path::PathBuf;

pub use json_layer::{JsonLayer, LogEntry};

/// Subscriber settings.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Written as `service` on every line.
    pub service_name: String,
    /// Filter used when `RUST_LOG` is unset.
    pub default_level: String,
    /// JSONL destination; `None` means `~/.partyhaus/logs/dev.jsonl`.
    pub log_path: Option<PathBuf>,
    /// Mirror records to stderr in compact form.
    pub also_stderr: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::for_service("partyhaus")
    }
}

impl LogConfig {
    pub fn for_service(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
        }
    }

    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.default_level = level.into();
        self
    }

    pub fn with_log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    pub fn with_stderr(mut self, also_stderr: bool) -> Self {
        self.also_stderr = also_stderr;
        self
    }
}

/// Install the global subscriber. A second call in the same process is a
/// no-op.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    dev::install(&config);

    #[cfg(not(feature = "dev"))]
    {
        use tracing_subscriber::util::SubscriberInitExt;
        let filter = tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .finish()
            .try_init();
    }
}
