use super::open_delivery_store;
use email_delivery_status::DeliveryReducer;
use partyhaus_config_and_utils::{Config, Paths};
use std::sync::Arc;
use tracing::{info, warn};
use webhook_server::AppState;

/// Run the webhook server until Ctrl-C.
pub async fn run_server(config: Config, paths: Paths) -> Result<(), Box<dyn std::error::Error>> {
    let addr = config.webhook_bind_addr()?;
    info!(
        addr = %addr,
        delivery_store = ?config.delivery_store,
        policy = ?config.email_status_policy,
        "Starting webhook server"
    );
    if config.resend_webhook_secret.is_none() {
        warn!("No webhook secret configured; accepting unsigned webhooks");
    }

    let store = open_delivery_store(&config, &paths).await?;
    let reducer = Arc::new(DeliveryReducer::new(store, config.email_status_policy));
    let state = AppState::new(reducer, config.resend_webhook_secret.clone());

    webhook_server::serve(addr, state, shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}
