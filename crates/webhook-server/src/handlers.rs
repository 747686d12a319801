use crate::{AppState, WebhookError, SECRET_HEADER};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use email_delivery_status::{DeliveryEvent, DeliveryOutcome};
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

pub async fn resend_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, WebhookError> {
    check_secret(&state, &headers)?;

    let payload: Value = serde_json::from_slice(&body)
        .map_err(|e| WebhookError::BadRequest(format!("invalid JSON body: {}", e)))?;
    let event = DeliveryEvent::from_webhook(payload)?;
    debug!(event_type = %event.event_type, email_id = %event.email_id, "Webhook received");

    let body = match state.reducer.apply_delivery_event(&event).await? {
        DeliveryOutcome::Applied {
            email_log_id,
            status,
        } => json!({
            "message": "Email status updated",
            "email_id": event.email_id,
            "status": status.as_str(),
            "email_log_id": email_log_id,
        }),
        DeliveryOutcome::Unprocessed { event_type, .. } => json!({
            "message": "Event type not processed",
            "type": event_type,
        }),
    };
    Ok(Json(body))
}

/// A missing header is accepted; only a present, mismatched one is rejected.
fn check_secret(state: &AppState, headers: &HeaderMap) -> Result<(), WebhookError> {
    let (Some(expected), Some(given)) = (state.webhook_secret.as_deref(), headers.get(SECRET_HEADER))
    else {
        return Ok(());
    };
    if given.as_bytes() != expected.as_bytes() {
        warn!("Rejected webhook with invalid secret");
        return Err(WebhookError::Unauthorized);
    }
    Ok(())
}
