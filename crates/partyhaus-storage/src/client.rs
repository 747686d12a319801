//! Typed accessors over a [`LocalStorage`] backend.

use crate::{LocalStorage, StorageKeys, StorageResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Supabase auth session as stored on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredAuthSession {
    pub access_token: String,
    pub refresh_token: String,
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    /// When the access token expires (RFC 3339)
    pub expires_at: String,
}

impl StoredAuthSession {
    /// Expired, or within 60 seconds of expiring. Unparseable timestamps
    /// count as expired.
    pub fn is_expired(&self) -> bool {
        match chrono::DateTime::parse_from_rfc3339(&self.expires_at) {
            Ok(expires_at) => {
                expires_at
                    .signed_duration_since(chrono::Utc::now())
                    .num_seconds()
                    < 60
            }
            Err(_) => true,
        }
    }
}

/// High-level API over the client's local storage. Cheap to clone.
#[derive(Clone)]
pub struct ClientStorage {
    storage: Arc<dyn LocalStorage>,
}

impl ClientStorage {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self { storage }
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        match self.storage.get(key)? {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn set_json<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let json = serde_json::to_string(value)?;
        self.storage.set(key, &json)
    }

    // ==========================================
    // Persisted session subset
    // ==========================================

    /// Load the persisted session subset. The caller owns the shape.
    pub fn load_session<T: DeserializeOwned>(&self) -> StorageResult<Option<T>> {
        self.get_json(StorageKeys::PERSISTED_SESSION)
    }

    pub fn save_session<T: Serialize>(&self, snapshot: &T) -> StorageResult<()> {
        self.set_json(StorageKeys::PERSISTED_SESSION, snapshot)
    }

    pub fn clear_session(&self) -> StorageResult<bool> {
        self.storage.delete(StorageKeys::PERSISTED_SESSION)
    }

    // ==========================================
    // Auth session
    // ==========================================

    pub fn set_auth_session(&self, session: &StoredAuthSession) -> StorageResult<()> {
        self.set_json(StorageKeys::AUTH_SESSION, session)
    }

    pub fn get_auth_session(&self) -> StorageResult<Option<StoredAuthSession>> {
        self.get_json(StorageKeys::AUTH_SESSION)
    }

    pub fn has_auth_session(&self) -> StorageResult<bool> {
        self.storage.has(StorageKeys::AUTH_SESSION)
    }

    pub fn clear_auth_session(&self) -> StorageResult<()> {
        let _ = self.storage.delete(StorageKeys::AUTH_SESSION)?;
        Ok(())
    }
}
