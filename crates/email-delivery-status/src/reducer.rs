//! Applies inbound delivery events to email logs.

use crate::{resolve_status, DeliveryError, DeliveryEvent, DeliveryResult, DeliveryStore};
use chrono::Utc;
use partyhaus_config_and_utils::EmailStatusPolicy;
use partyhaus_database::{EmailLog, EmailStatus, NewEmailEvent};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Statuses mirrored onto the guest row.
const GUEST_MIRRORED: [EmailStatus; 4] = [
    EmailStatus::Delivered,
    EmailStatus::Opened,
    EmailStatus::Clicked,
    EmailStatus::Bounced,
];

/// Result of one `apply_delivery_event` call.
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    /// Known event type; the log now carries `status`.
    Applied {
        email_log_id: String,
        status: EmailStatus,
    },
    /// Event type not handled. `email_log_id` is set when the audit row was
    /// still written.
    Unprocessed {
        email_log_id: Option<String>,
        event_type: String,
    },
}

pub struct DeliveryReducer {
    store: Arc<dyn DeliveryStore>,
    policy: EmailStatusPolicy,
}

impl DeliveryReducer {
    pub fn new(store: Arc<dyn DeliveryStore>, policy: EmailStatusPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> EmailStatusPolicy {
        self.policy
    }

    /// Apply one event: update the log, append the audit row, then mirror the
    /// status onto the guest if the guest still points at this log.
    ///
    /// Re-applying an identical event leaves the log unchanged and adds one
    /// more audit row.
    pub async fn apply_delivery_event(
        &self,
        event: &DeliveryEvent,
    ) -> DeliveryResult<DeliveryOutcome> {
        if event.event_type.trim().is_empty() {
            return Err(DeliveryError::Validation("event type is empty".to_string()));
        }
        if event.email_id.trim().is_empty() {
            return Err(DeliveryError::Validation("email id is empty".to_string()));
        }

        let log = self.store.find_email_log_by_resend_id(&event.email_id).await?;
        let at = event.timestamp.unwrap_or_else(Utc::now);

        let Some(kind) = event.kind() else {
            let email_log_id = match log {
                Some(log) => {
                    self.append_audit(&log, event, at).await?;
                    Some(log.id)
                }
                None => None,
            };
            info!(
                event_type = %event.event_type,
                email_id = %event.email_id,
                "Delivery event type not processed"
            );
            return Ok(DeliveryOutcome::Unprocessed {
                email_log_id,
                event_type: event.event_type.clone(),
            });
        };

        let log = log.ok_or_else(|| {
            DeliveryError::NotFound(format!("email log for {}", event.email_id))
        })?;

        let proposed = kind.target_status();
        let status = resolve_status(self.policy, log.status, proposed);
        if status != proposed {
            debug!(
                email_log_id = %log.id,
                current = log.status.as_str(),
                proposed = proposed.as_str(),
                "Keeping higher-ranked status"
            );
        }

        let mut update = kind.log_update(at, &event.payload);
        update.status = Some(status);
        if !self.store.update_email_log(&log.id, &update).await? {
            return Err(DeliveryError::NotFound(format!("email log {}", log.id)));
        }

        self.append_audit(&log, event, at).await?;

        info!(
            email_log_id = %log.id,
            event_type = kind.as_str(),
            status = status.as_str(),
            "Applied delivery event"
        );

        if GUEST_MIRRORED.contains(&proposed) {
            if let Some(guest_id) = &log.guest_id {
                self.mirror_to_guest(guest_id, &log.id, status).await;
            }
        }

        Ok(DeliveryOutcome::Applied {
            email_log_id: log.id,
            status,
        })
    }

    async fn append_audit(
        &self,
        log: &EmailLog,
        event: &DeliveryEvent,
        at: chrono::DateTime<Utc>,
    ) -> DeliveryResult<()> {
        self.store
            .append_email_event(&NewEmailEvent {
                id: uuid::Uuid::new_v4().to_string(),
                email_log_id: log.id.clone(),
                resend_email_id: event.email_id.clone(),
                event_type: event.event_type.clone(),
                timestamp: at,
                webhook_data: event.payload.clone(),
            })
            .await?;
        Ok(())
    }

    async fn mirror_to_guest(&self, guest_id: &str, email_log_id: &str, status: EmailStatus) {
        match self
            .store
            .update_guest_email_status_if_current(guest_id, email_log_id, status)
            .await
        {
            Ok(true) => debug!(guest_id, email_log_id, "Guest email status updated"),
            Ok(false) => debug!(
                guest_id,
                email_log_id, "Guest points at a newer email, status left alone"
            ),
            Err(e) => warn!(
                guest_id,
                email_log_id,
                error = %e,
                "Failed to update guest email status"
            ),
        }
    }
}
