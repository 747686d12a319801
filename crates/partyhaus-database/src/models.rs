//! Database model types.
//!
//! The same types travel over the Supabase REST API, so field names match
//! the hosted column names and every optional column deserializes from
//! either `null` or a missing key.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Normalized copy of the auth provider's identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A party hosted by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    pub event_date: String,
    pub host_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub max_guests: Option<i64>,
}

/// Partial update for an [`Event`]. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_guests: Option<i64>,
}

impl Event {
    pub fn apply(&mut self, patch: &EventPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(description) = &patch.description {
            self.description = Some(description.clone());
        }
        if let Some(location) = &patch.location {
            self.location = Some(location.clone());
        }
        if let Some(event_date) = &patch.event_date {
            self.event_date = event_date.clone();
        }
        if let Some(is_public) = patch.is_public {
            self.is_public = is_public;
        }
        if let Some(max_guests) = patch.max_guests {
            self.max_guests = Some(max_guests);
        }
    }
}

/// New event for insertion.
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub event_date: String,
    pub host_id: String,
    pub is_public: bool,
    pub max_guests: Option<i64>,
}

/// RSVP status of a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GuestStatus {
    #[default]
    Pending,
    Confirmed,
    Declined,
}

impl GuestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Declined => "declined",
        }
    }

    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "confirmed" => Self::Confirmed,
            "declined" => Self::Declined,
            _ => Self::Pending,
        }
    }
}

/// A guest invited to exactly one event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    pub id: String,
    pub event_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub status: GuestStatus,
    #[serde(default)]
    pub is_checked_in: bool,
    /// Denormalized status of the guest's current invitation email.
    #[serde(default)]
    pub email_status: Option<EmailStatus>,
    /// Email log the denormalized status belongs to.
    #[serde(default)]
    pub current_email_log_id: Option<String>,
}

/// Partial update for a [`Guest`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<GuestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_checked_in: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_status: Option<EmailStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_email_log_id: Option<String>,
}

impl Guest {
    pub fn apply(&mut self, patch: &GuestPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(email) = &patch.email {
            self.email = email.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(is_checked_in) = patch.is_checked_in {
            self.is_checked_in = is_checked_in;
        }
        if let Some(email_status) = patch.email_status {
            self.email_status = Some(email_status);
        }
        if let Some(log_id) = &patch.current_email_log_id {
            self.current_email_log_id = Some(log_id.clone());
        }
    }
}

/// New guest for insertion.
#[derive(Debug, Clone)]
pub struct NewGuest {
    pub id: String,
    pub event_id: String,
    pub user_id: Option<String>,
    pub name: String,
    pub email: String,
    pub status: GuestStatus,
}

/// Delivery status of one outbound email.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmailStatus {
    Sent,
    Delivered,
    /// Provider reported a delivery delay.
    Pending,
    Bounced,
    Complained,
    Opened,
    Clicked,
}

impl EmailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Pending => "pending",
            Self::Bounced => "bounced",
            Self::Complained => "complained",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "sent" => Some(Self::Sent),
            "delivered" => Some(Self::Delivered),
            "pending" => Some(Self::Pending),
            "bounced" => Some(Self::Bounced),
            "complained" => Some(Self::Complained),
            "opened" => Some(Self::Opened),
            "clicked" => Some(Self::Clicked),
            _ => None,
        }
    }

    /// Progress rank: pending < sent < delivered < opened < clicked, with
    /// bounced and complained above everything.
    pub fn rank(&self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Sent => 1,
            Self::Delivered => 2,
            Self::Opened => 3,
            Self::Clicked => 4,
            Self::Bounced | Self::Complained => 5,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Bounced | Self::Complained)
    }
}

/// Lifecycle record for one outbound email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailLog {
    pub id: String,
    pub resend_email_id: String,
    #[serde(default)]
    pub guest_id: Option<String>,
    pub status: EmailStatus,
    #[serde(default)]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub clicked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub bounced_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub error_message: Option<String>,
    /// Raw payload of the most recent webhook applied to this log.
    #[serde(default)]
    pub webhook_data: Option<serde_json::Value>,
}

/// New email log, written when an invitation is dispatched.
#[derive(Debug, Clone, Serialize)]
pub struct NewEmailLog {
    pub id: String,
    pub resend_email_id: String,
    pub guest_id: Option<String>,
    pub status: EmailStatus,
    pub sent_at: Option<DateTime<Utc>>,
}

/// Fields written to an email log by one delivery event.
///
/// `None` leaves the stored column as it is; `webhook_data` is always
/// replaced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EmailLogUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EmailStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opened_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicked_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounced_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub webhook_data: serde_json::Value,
}

/// Append-only audit row for one inbound delivery webhook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailEvent {
    pub id: String,
    pub email_log_id: String,
    pub resend_email_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub webhook_data: serde_json::Value,
}

/// New email event for insertion.
#[derive(Debug, Clone, Serialize)]
pub struct NewEmailEvent {
    pub id: String,
    pub email_log_id: String,
    pub resend_email_id: String,
    pub event_type: String,
    pub timestamp: DateTime<Utc>,
    pub webhook_data: serde_json::Value,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_status_roundtrip() {
        for status in [
            EmailStatus::Sent,
            EmailStatus::Delivered,
            EmailStatus::Pending,
            EmailStatus::Bounced,
            EmailStatus::Complained,
            EmailStatus::Opened,
            EmailStatus::Clicked,
        ] {
            assert_eq!(EmailStatus::from_str(status.as_str()), Some(status));
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        assert_eq!(EmailStatus::from_str("queued"), None);
    }

    #[test]
    fn email_status_rank_order() {
        assert!(EmailStatus::Pending.rank() < EmailStatus::Sent.rank());
        assert!(EmailStatus::Sent.rank() < EmailStatus::Delivered.rank());
        assert!(EmailStatus::Delivered.rank() < EmailStatus::Opened.rank());
        assert!(EmailStatus::Opened.rank() < EmailStatus::Clicked.rank());
        assert!(EmailStatus::Clicked.rank() < EmailStatus::Bounced.rank());
        assert_eq!(EmailStatus::Bounced.rank(), EmailStatus::Complained.rank());
        assert!(EmailStatus::Complained.is_terminal());
        assert!(!EmailStatus::Clicked.is_terminal());
    }

    #[test]
    fn guest_status_defaults_to_pending() {
        assert_eq!(GuestStatus::from_str("CONFIRMED"), GuestStatus::Confirmed);
        assert_eq!(GuestStatus::from_str("maybe"), GuestStatus::Pending);
        assert_eq!(GuestStatus::default(), GuestStatus::Pending);
    }

    #[test]
    fn guest_deserializes_with_nulls_and_missing_columns() {
        let guest: Guest = serde_json::from_value(serde_json::json!({
            "id": "g1",
            "event_id": "e1",
            "user_id": null,
            "name": "Ada",
            "email": "ada@example.com",
            "status": "confirmed"
        }))
        .unwrap();

        assert_eq!(guest.status, GuestStatus::Confirmed);
        assert!(!guest.is_checked_in);
        assert!(guest.email_status.is_none());
        assert!(guest.current_email_log_id.is_none());
    }

    #[test]
    fn patches_only_touch_present_fields() {
        let mut event = Event {
            id: "e1".into(),
            name: "Launch".into(),
            description: None,
            location: Some("Roof".into()),
            event_date: "2026-11-01".into(),
            host_id: "u1".into(),
            is_public: false,
            max_guests: None,
        };
        event.apply(&EventPatch {
            name: Some("Launch party".into()),
            max_guests: Some(40),
            ..Default::default()
        });
        assert_eq!(event.name, "Launch party");
        assert_eq!(event.location.as_deref(), Some("Roof"));
        assert_eq!(event.max_guests, Some(40));

        let mut guest = Guest {
            id: "g1".into(),
            event_id: "e1".into(),
            user_id: None,
            name: "Ada".into(),
            email: "ada@example.com".into(),
            status: GuestStatus::Pending,
            is_checked_in: false,
            email_status: None,
            current_email_log_id: None,
        };
        guest.apply(&GuestPatch {
            is_checked_in: Some(true),
            ..Default::default()
        });
        assert!(guest.is_checked_in);
        assert_eq!(guest.status, GuestStatus::Pending);
    }

    #[test]
    fn email_log_update_serializes_only_set_fields() {
        let update = EmailLogUpdate {
            status: Some(EmailStatus::Pending),
            webhook_data: serde_json::json!({"type": "email.delivery_delayed"}),
            ..Default::default()
        };
        let json = serde_json::to_value(&update).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["status".to_string(), "webhook_data".to_string()]);
    }
}
