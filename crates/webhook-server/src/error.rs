//! HTTP error mapping for the webhook surface.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use email_delivery_status::DeliveryError;
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum WebhookError {
    /// Body is not JSON or lacks `type`/`data`/`data.email_id`
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Secret header present and wrong
    #[error("Invalid webhook secret")]
    Unauthorized,

    /// No email log for the provider id
    #[error("Not found: {0}")]
    NotFound(String),

    /// Anything else; detail stays in the server log
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<DeliveryError> for WebhookError {
    fn from(e: DeliveryError) -> Self {
        match e {
            DeliveryError::Validation(msg) => WebhookError::BadRequest(msg),
            DeliveryError::NotFound(msg) => WebhookError::NotFound(msg),
            other => WebhookError::Internal(other.to_string()),
        }
    }
}

impl WebhookError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebhookError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebhookError::Unauthorized => StatusCode::UNAUTHORIZED,
            WebhookError::NotFound(_) => StatusCode::NOT_FOUND,
            WebhookError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let message = match &self {
            WebhookError::BadRequest(msg) => msg.clone(),
            WebhookError::Unauthorized => "Invalid webhook secret".to_string(),
            WebhookError::NotFound(_) => "Email log not found".to_string(),
            WebhookError::Internal(detail) => {
                error!(error = %detail, "Webhook processing failed");
                "Internal server error".to_string()
            }
        };
        (self.status(), Json(serde_json::json!({ "error": message }))).into_response()
    }
}
