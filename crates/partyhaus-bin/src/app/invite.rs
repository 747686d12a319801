use super::open_delivery_store;
use email_delivery_status::{InvitationDispatcher, ResendClient};
use partyhaus_config_and_utils::{Config, Paths};
use tracing::info;

/// Send one invitation and point the guest at the new email log.
pub async fn send_invitation(
    config: &Config,
    paths: &Paths,
    guest_id: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let resend = ResendClient::new(config.require_resend_api_key()?);
    let store = open_delivery_store(config, paths).await?;
    let dispatcher = InvitationDispatcher::new(store, resend, config.email_from.clone());

    let log = dispatcher.dispatch_invitation(guest_id).await?;
    info!(guest_id = %guest_id, email_log_id = %log.id, "Invitation sent");
    println!("Invitation sent");
    println!("  Email log: {}", log.id);
    println!("  Resend id: {}", log.resend_email_id);
    Ok(())
}
