use super::print_state;
use crate::app::{auth_client, client_storage, session_store};
use partyhaus_config_and_utils::{Config, Paths};
use tracing::info;

/// Sign in, then load the user's events into the session store.
pub async fn login(
    config: &Config,
    paths: &Paths,
    email: &str,
    password: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let storage = client_storage(paths)?;
    let auth = auth_client(config, storage.clone())?;
    let store = session_store(config, storage, auth.clone())?;
    store.rehydrate().await;

    let mut notifications = auth.subscribe();
    let user = auth.sign_in_with_password(email, password).await?;
    info!(user_id = %user.id, "Logged in");

    // Apply the SIGNED_IN notification in-line rather than through a listener
    // task so the events fetch finishes before we print.
    if let Ok(notification) = notifications.try_recv() {
        store.handle_auth_notification(notification).await;
    }

    print_state(&store);
    Ok(())
}
