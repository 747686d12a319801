use crate::app::{auth_client, client_storage, session_store};
use partyhaus_config_and_utils::{Config, Paths};

/// Clear the local session, then wait for the remote sign-out to finish.
pub async fn logout(config: &Config, paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let storage = client_storage(paths)?;
    let auth = auth_client(config, storage.clone())?;
    let store = session_store(config, storage, auth)?;
    store.rehydrate().await;

    if let Some(sign_out) = store.logout() {
        sign_out.await?;
    }
    println!("Logged out");
    Ok(())
}
