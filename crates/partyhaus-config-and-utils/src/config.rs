//! Configuration management.
//!
//! The config file (`~/.partyhaus/config.json`) holds non-secret settings.
//! Credentials (Supabase service role key, Resend API key, webhook secret)
//! are read from the environment only and are never written back to disk.

use crate::{CoreError, CoreResult, Paths};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Default Supabase URL (can be overridden at compile time via SUPABASE_URL env var).
pub const DEFAULT_SUPABASE_URL: &str = match option_env!("SUPABASE_URL") {
    Some(url) => url,
    None => "https://partyhaus.supabase.co",
};

/// Default Supabase publishable key (can be overridden at compile time via SUPABASE_PUBLISHABLE_KEY env var).
pub const DEFAULT_SUPABASE_PUBLISHABLE_KEY: &str = match option_env!("SUPABASE_PUBLISHABLE_KEY") {
    Some(key) => key,
    None => "partyhaus-publishable-key",
};

/// Default log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Sender used for invitation emails.
pub const DEFAULT_EMAIL_FROM: &str = "PartyHaus <invites@partyhaus.app>";

/// Listen address for the delivery webhook server.
pub const DEFAULT_WEBHOOK_BIND_ADDR: &str = "127.0.0.1:8787";

/// Upper bound on the startup session-restore check.
pub const DEFAULT_SESSION_RESTORE_TIMEOUT_MS: u64 = 5_000;

const ENV_LOG_LEVEL: &str = "PARTYHAUS_LOG_LEVEL";
const ENV_SERVICE_ROLE_KEY: &str = "PARTYHAUS_SUPABASE_SERVICE_ROLE_KEY";
const ENV_RESEND_API_KEY: &str = "PARTYHAUS_RESEND_API_KEY";
const ENV_WEBHOOK_SECRET: &str = "PARTYHAUS_RESEND_WEBHOOK_SECRET";
const ENV_WEBHOOK_BIND_ADDR: &str = "PARTYHAUS_WEBHOOK_BIND_ADDR";

/// Where the delivery webhook reads and writes email logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStoreKind {
    /// Local SQLite database at `Paths::database_file`.
    #[default]
    Sqlite,
    /// Supabase REST tables, authenticated with the service role key.
    Supabase,
}

/// How out-of-order delivery webhooks are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatusPolicy {
    /// Apply every event in arrival order.
    #[default]
    LastWriteWins,
    /// Never move an email log back to a lower-ranked status.
    ForwardOnly,
}

/// Main configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Supabase project URL.
    #[serde(default = "default_supabase_url")]
    pub supabase_url: String,
    /// Supabase publishable API key (public, safe to expose).
    #[serde(default = "default_supabase_publishable_key")]
    pub supabase_publishable_key: String,
    /// `From` header for invitation emails.
    #[serde(default = "default_email_from")]
    pub email_from: String,
    /// Listen address for `partyhaus serve`.
    #[serde(default = "default_webhook_bind_addr")]
    pub webhook_bind_addr: String,
    #[serde(default)]
    pub delivery_store: DeliveryStoreKind,
    #[serde(default)]
    pub email_status_policy: EmailStatusPolicy,
    #[serde(default = "default_session_restore_timeout_ms")]
    pub session_restore_timeout_ms: u64,
    /// Supabase service role key (environment only).
    #[serde(skip)]
    pub supabase_service_role_key: Option<String>,
    /// Resend API key (environment only).
    #[serde(skip)]
    pub resend_api_key: Option<String>,
    /// Shared secret expected in the `resend-webhook-secret` header (environment only).
    #[serde(skip)]
    pub resend_webhook_secret: Option<String>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_supabase_url() -> String {
    DEFAULT_SUPABASE_URL.to_string()
}

fn default_supabase_publishable_key() -> String {
    DEFAULT_SUPABASE_PUBLISHABLE_KEY.to_string()
}

fn default_email_from() -> String {
    DEFAULT_EMAIL_FROM.to_string()
}

fn default_webhook_bind_addr() -> String {
    DEFAULT_WEBHOOK_BIND_ADDR.to_string()
}

fn default_session_restore_timeout_ms() -> u64 {
    DEFAULT_SESSION_RESTORE_TIMEOUT_MS
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            supabase_url: default_supabase_url(),
            supabase_publishable_key: default_supabase_publishable_key(),
            email_from: default_email_from(),
            webhook_bind_addr: default_webhook_bind_addr(),
            delivery_store: DeliveryStoreKind::default(),
            email_status_policy: EmailStatusPolicy::default(),
            session_restore_timeout_ms: DEFAULT_SESSION_RESTORE_TIMEOUT_MS,
            supabase_service_role_key: None,
            resend_api_key: None,
            resend_webhook_secret: None,
        }
    }
}

impl Config {
    /// Load configuration from the config file (defaults when absent), then
    /// apply environment overrides.
    pub fn load(paths: &Paths) -> CoreResult<Self> {
        let config_path = paths.config_file();

        let mut config = if config_path.exists() {
            Self::load_from_file(&config_path)?
        } else {
            Self::default()
        };

        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a file. Secrets are skipped.
    pub fn save(&self, paths: &Paths) -> CoreResult<()> {
        paths.ensure_dirs()?;
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(paths.config_file(), content)?;
        Ok(())
    }

    /// Override settings from environment variables via `lookup`.
    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let read = |name: &str| lookup(name).and_then(non_empty);

        if let Some(level) = read(ENV_LOG_LEVEL) {
            self.log_level = level;
        }
        if let Some(addr) = read(ENV_WEBHOOK_BIND_ADDR) {
            self.webhook_bind_addr = addr;
        }
        self.supabase_service_role_key = read(ENV_SERVICE_ROLE_KEY);
        self.resend_api_key = read(ENV_RESEND_API_KEY);
        self.resend_webhook_secret = read(ENV_WEBHOOK_SECRET);
    }

    /// Get the Supabase URL as a parsed URL.
    pub fn supabase_url(&self) -> CoreResult<Url> {
        Url::parse(&self.supabase_url).map_err(CoreError::from)
    }

    /// Parsed webhook listen address.
    pub fn webhook_bind_addr(&self) -> CoreResult<SocketAddr> {
        self.webhook_bind_addr.parse().map_err(|_| {
            CoreError::Config(format!(
                "invalid webhook_bind_addr: {}",
                self.webhook_bind_addr
            ))
        })
    }

    pub fn session_restore_timeout(&self) -> Duration {
        Duration::from_millis(self.session_restore_timeout_ms)
    }

    /// The service role key, required when the Supabase delivery store is used.
    pub fn require_service_role_key(&self) -> CoreResult<&str> {
        self.supabase_service_role_key.as_deref().ok_or_else(|| {
            CoreError::Config(format!("{} is not set", ENV_SERVICE_ROLE_KEY))
        })
    }

    /// The Resend API key, required for sending invitations.
    pub fn require_resend_api_key(&self) -> CoreResult<&str> {
        self.resend_api_key
            .as_deref()
            .ok_or_else(|| CoreError::Config(format!("{} is not set", ENV_RESEND_API_KEY)))
    }
}

fn non_empty(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
