//! Durable local storage for the PartyHaus client.
//!
//! Two backends implement [`LocalStorage`]:
//! - [`FileStorage`]: a JSON object on disk, rewritten atomically on every change
//! - [`MemoryStorage`]: a process-local map, used by tests and ephemeral sessions
//!
//! [`ClientStorage`] layers typed accessors for the persisted session subset
//! and the stored auth session on top of either backend.

mod client;
mod file;
mod keys;
mod memory;
mod traits;

pub use client::{ClientStorage, StoredAuthSession};
pub use file::FileStorage;
pub use keys::StorageKeys;
pub use memory::MemoryStorage;
pub use traits::LocalStorage;

use thiserror::Error;

/// Error type for storage operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Encoding/decoding error
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Encoding(err.to_string())
    }
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
