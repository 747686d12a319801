//! Inbound delivery events and the transition table.

use crate::{DeliveryError, DeliveryResult};
use chrono::{DateTime, Utc};
use partyhaus_database::{EmailLogUpdate, EmailStatus};
use serde_json::Value;

const BOUNCED_FALLBACK: &str = "Email bounced";
const COMPLAINED_FALLBACK: &str = "Recipient marked the email as spam";

/// Event types the provider sends that change an email's status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryEventType {
    Sent,
    Delivered,
    DeliveryDelayed,
    Bounced,
    Complained,
    Opened,
    Clicked,
}

impl DeliveryEventType {
    pub const ALL: [DeliveryEventType; 7] = [
        Self::Sent,
        Self::Delivered,
        Self::DeliveryDelayed,
        Self::Bounced,
        Self::Complained,
        Self::Opened,
        Self::Clicked,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "email.sent",
            Self::Delivered => "email.delivered",
            Self::DeliveryDelayed => "email.delivery_delayed",
            Self::Bounced => "email.bounced",
            Self::Complained => "email.complained",
            Self::Opened => "email.opened",
            Self::Clicked => "email.clicked",
        }
    }

    /// `None` for event types this reducer does not process.
    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.as_str() == raw)
    }

    pub fn target_status(&self) -> EmailStatus {
        match self {
            Self::Sent => EmailStatus::Sent,
            Self::Delivered => EmailStatus::Delivered,
            Self::DeliveryDelayed => EmailStatus::Pending,
            Self::Bounced => EmailStatus::Bounced,
            Self::Complained => EmailStatus::Complained,
            Self::Opened => EmailStatus::Opened,
            Self::Clicked => EmailStatus::Clicked,
        }
    }

    /// Fields this event writes to the email log: the new status, its
    /// timestamp column, the error message for bounces and complaints, and
    /// the raw payload.
    pub fn log_update(&self, at: DateTime<Utc>, payload: &Value) -> EmailLogUpdate {
        let mut update = EmailLogUpdate {
            status: Some(self.target_status()),
            webhook_data: payload.clone(),
            ..Default::default()
        };
        match self {
            Self::Sent => update.sent_at = Some(at),
            Self::Delivered => update.delivered_at = Some(at),
            Self::DeliveryDelayed => {}
            Self::Bounced => {
                update.bounced_at = Some(at);
                update.error_message = Some(provider_error(payload, BOUNCED_FALLBACK));
            }
            Self::Complained => {
                update.error_message = Some(provider_error(payload, COMPLAINED_FALLBACK));
            }
            Self::Opened => update.opened_at = Some(at),
            Self::Clicked => update.clicked_at = Some(at),
        }
        update
    }
}

fn provider_error(payload: &Value, fallback: &str) -> String {
    payload
        .pointer("/data/error/message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// One inbound webhook, validated just enough to identify an email.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryEvent {
    /// Raw provider event type, kept even when unrecognized.
    pub event_type: String,
    /// Provider-assigned email id.
    pub email_id: String,
    /// `data.created_at` when present and parseable.
    pub timestamp: Option<DateTime<Utc>>,
    /// Full request body.
    pub payload: Value,
}

impl DeliveryEvent {
    /// Build from a webhook body `{type, data: {email_id, created_at?, ...}}`.
    pub fn from_webhook(payload: Value) -> DeliveryResult<Self> {
        let event_type = payload
            .get("type")
            .and_then(Value::as_str)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DeliveryError::Validation("missing event type".to_string()))?
            .to_string();

        let data = payload
            .get("data")
            .filter(|d| d.is_object())
            .ok_or_else(|| DeliveryError::Validation("missing data".to_string()))?;

        let email_id = data
            .get("email_id")
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| DeliveryError::Validation("missing data.email_id".to_string()))?
            .to_string();

        let timestamp = data
            .get("created_at")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|dt| dt.with_timezone(&Utc));

        Ok(Self {
            event_type,
            email_id,
            timestamp,
            payload,
        })
    }

    pub fn kind(&self) -> Option<DeliveryEventType> {
        DeliveryEventType::parse(&self.event_type)
    }
}
