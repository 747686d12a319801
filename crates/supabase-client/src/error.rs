//! Backend client error types.

use thiserror::Error;

/// Error type for Supabase REST and auth calls.
#[derive(Error, Debug)]
pub enum SupabaseError {
    /// Non-success HTTP response from the REST or auth API
    #[error("Supabase API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid email or password
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// Stored session rejected by the server
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// No stored session
    #[error("Not logged in")]
    NotLoggedIn,

    /// Payload did not have the expected shape
    #[error("Decode error: {0}")]
    Decode(String),

    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(#[from] partyhaus_storage::StorageError),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Operation timed out
    #[error("Operation timed out")]
    Timeout,
}

impl SupabaseError {
    /// Returns true if the failure is worth retrying later: connection
    /// failures, timeouts and 5xx responses.
    pub fn is_transient(&self) -> bool {
        match self {
            SupabaseError::Timeout => true,
            SupabaseError::Api { status, .. } => *status >= 500,
            SupabaseError::Http(e) => {
                if e.is_connect() || e.is_timeout() {
                    return true;
                }
                e.status().map(|s| s.is_server_error()).unwrap_or(false)
            }
            _ => false,
        }
    }
}

/// Result type alias using SupabaseError.
pub type SupabaseResult<T> = Result<T, SupabaseError>;
