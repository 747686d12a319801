//! Construction of stores and clients from configuration.

use email_delivery_status::{DeliveryStore, SqliteDeliveryStore, SupabaseDeliveryStore};
use partyhaus_config_and_utils::{Config, DeliveryStoreKind, Paths};
use partyhaus_database::AsyncDatabase;
use partyhaus_storage::{ClientStorage, FileStorage};
use session_state_store::{SessionStore, SupabaseSessionBackend};
use std::sync::Arc;
use supabase_client::{AuthClient, SupabaseClient};
use tracing::info;

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Durable record store selected by `delivery_store`.
pub async fn open_delivery_store(config: &Config, paths: &Paths) -> AppResult<Arc<dyn DeliveryStore>> {
    match config.delivery_store {
        DeliveryStoreKind::Sqlite => {
            let db = AsyncDatabase::open(&paths.database_file()).await?;
            info!(path = %db.path(), "Using SQLite delivery store");
            Ok(Arc::new(SqliteDeliveryStore::new(db)))
        }
        DeliveryStoreKind::Supabase => {
            let key = config.require_service_role_key()?;
            let client = SupabaseClient::new(config.supabase_url()?.as_str(), key);
            info!(supabase_url = %config.supabase_url, "Using Supabase delivery store");
            Ok(Arc::new(SupabaseDeliveryStore::new(client)))
        }
    }
}

/// Client-side key/value storage backed by the local storage file.
pub fn client_storage(paths: &Paths) -> AppResult<ClientStorage> {
    let file = FileStorage::open(paths.local_storage_file())?;
    Ok(ClientStorage::new(Arc::new(file)))
}

pub fn auth_client(config: &Config, storage: ClientStorage) -> AppResult<Arc<AuthClient>> {
    Ok(Arc::new(AuthClient::new(
        config.supabase_url()?.as_str(),
        &config.supabase_publishable_key,
        storage,
        config.session_restore_timeout(),
    )))
}

/// Session store talking to Supabase as the signed-in user.
pub fn session_store(
    config: &Config,
    storage: ClientStorage,
    auth: Arc<AuthClient>,
) -> AppResult<Arc<SessionStore>> {
    let rest = SupabaseClient::new(
        config.supabase_url()?.as_str(),
        config.supabase_publishable_key.clone(),
    );
    let backend = Arc::new(SupabaseSessionBackend::new(rest, auth));
    Ok(Arc::new(SessionStore::new(backend, storage)))
}
