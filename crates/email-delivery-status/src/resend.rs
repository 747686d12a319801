//! Resend email-send client.

use crate::{DeliveryError, DeliveryResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";

/// Body of `POST /emails`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundEmail {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub html: String,
}

#[derive(Deserialize)]
struct SendResponse {
    id: String,
}

#[derive(Clone)]
pub struct ResendClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl ResendClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_api_url(DEFAULT_RESEND_API_URL, api_key)
    }

    pub fn with_api_url(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Send one email and return the provider-assigned id.
    pub async fn send(&self, email: &OutboundEmail) -> DeliveryResult<String> {
        let response = self
            .http_client
            .post(format!("{}/emails", self.api_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(email)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body_len = body.len(), "Resend rejected email");
            return Err(DeliveryError::Resend {
                status: status.as_u16(),
                message: provider_message(&body),
            });
        }

        let sent: SendResponse = response.json().await?;
        debug!(resend_email_id = %sent.id, to = email.to.len(), "Email accepted by Resend");
        Ok(sent.id)
    }
}

/// The `message` field of a Resend error body, or a generic fallback.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(str::to_string))
        .unwrap_or_else(|| "send failed".to_string())
}
