//! Session store error types.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// Local storage error
    #[error("Storage error: {0}")]
    Storage(#[from] partyhaus_storage::StorageError),

    /// Backend (Supabase) error
    #[error("Backend error: {0}")]
    Backend(#[from] supabase_client::SupabaseError),

    /// Operation needs a signed-in user
    #[error("Not logged in")]
    NotLoggedIn,
}

impl StoreError {
    /// Transient backend failures; the store records these and waits for
    /// the UI to retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Backend(e) if e.is_transient())
    }
}

/// Result type alias using StoreError.
pub type StoreResult<T> = Result<T, StoreError>;
