//! Configuration, filesystem paths and logging setup shared by the PartyHaus
//! binaries and services.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DeliveryStoreKind, EmailStatusPolicy, DEFAULT_EMAIL_FROM, DEFAULT_LOG_LEVEL,
    DEFAULT_SESSION_RESTORE_TIMEOUT_MS, DEFAULT_SUPABASE_PUBLISHABLE_KEY, DEFAULT_SUPABASE_URL,
    DEFAULT_WEBHOOK_BIND_ADDR,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, init_logging_for_service, parse_level};
pub use paths::Paths;
