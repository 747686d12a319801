//! Storage key constants.

/// Storage keys used by the client.
pub struct StorageKeys;

impl StorageKeys {
    /// Persisted session subset (JSON: user, current page, current event, events)
    pub const PERSISTED_SESSION: &'static str = "partyhaus-storage";

    /// Supabase auth session (JSON, see `StoredAuthSession`)
    pub const AUTH_SESSION: &'static str = "supabase_auth_session";
}
