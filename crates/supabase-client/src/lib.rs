//! Client for the hosted PartyHaus backend (Supabase).
//!
//! - [`SupabaseClient`]: PostgREST reads and single-row writes on `events`,
//!   `guests`, `email_logs` and `email_events`
//! - [`AuthClient`]: password sign-in, sign-up, sign-out and the bounded
//!   startup session restore, plus the `SIGNED_IN` / `SIGNED_OUT` stream
//! - [`realtime`]: decoding of postgres-changes notifications and their
//!   in-process delivery

mod auth;
mod error;
pub mod realtime;
mod rest;

pub use auth::{AuthClient, AuthNotification, SessionRestoreOutcome};
pub use error::{SupabaseError, SupabaseResult};
pub use realtime::{ChangeEventType, ChangeFeed, ChangeNotification, Subscription};
pub use rest::SupabaseClient;

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Short, non-reversible description of a response body for logs.
pub(crate) fn summarize_response_body(body: &str) -> String {
    let mut hasher = DefaultHasher::new();
    body.hash(&mut hasher);
    format!("len={},digest={:016x}", body.len(), hasher.finish())
}
