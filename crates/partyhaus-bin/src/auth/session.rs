use super::print_state;
use crate::app::{auth_client, client_storage, session_store};
use partyhaus_config_and_utils::{Config, Paths};
use session_state_store::SessionStore;
use supabase_client::{AuthNotification, SessionRestoreOutcome};
use tracing::warn;

/// Verify the stored auth session (bounded) and show the cached state.
pub async fn show_session(config: &Config, paths: &Paths) -> Result<(), Box<dyn std::error::Error>> {
    let storage = client_storage(paths)?;
    let auth = auth_client(config, storage.clone())?;
    let store = session_store(config, storage, auth.clone())?;

    store.rehydrate().await;
    let outcome = auth.restore_session().await;
    if outcome == SessionRestoreOutcome::TimedOut {
        println!("Session check timed out; continuing signed out");
    }
    apply_restore_outcome(&store, outcome).await;

    print_state(&store);
    Ok(())
}

/// Feed the startup check into the store. Anything but a restored session
/// clears a cached user, a timeout included.
async fn apply_restore_outcome(store: &SessionStore, outcome: SessionRestoreOutcome) {
    match outcome {
        SessionRestoreOutcome::Restored(user) => {
            store
                .handle_auth_notification(AuthNotification::SignedIn(user))
                .await;
        }
        other => {
            if other == SessionRestoreOutcome::TimedOut {
                warn!("Auth server did not answer in time, proceeding without a session");
            }
            if store.user().is_some() {
                store.handle_auth_notification(AuthNotification::SignedOut).await;
            }
        }
    }
}
