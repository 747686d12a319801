//! Invitation dispatch: render, send, and record the email log that later
//! delivery events resolve against.

use crate::{DeliveryError, DeliveryResult, DeliveryStore, OutboundEmail, ResendClient};
use chrono::{DateTime, Utc};
use partyhaus_database::{EmailLog, EmailStatus, Event, Guest, NewEmailLog};
use std::sync::Arc;
use tracing::{info, warn};

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

fn display_date(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%A, %B %-d, %Y at %-I:%M %p").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Build the invitation email for one guest.
pub fn render_invitation(from: &str, guest: &Guest, event: &Event) -> OutboundEmail {
    let mut html = format!(
        "<h1>You're invited to {}!</h1>\n<p>Hi {},</p>\n<p><strong>When:</strong> {}</p>\n",
        escape_html(&event.name),
        escape_html(&guest.name),
        escape_html(&display_date(&event.event_date)),
    );
    if let Some(location) = event.location.as_deref().filter(|l| !l.is_empty()) {
        html.push_str(&format!("<p><strong>Where:</strong> {}</p>\n", escape_html(location)));
    }
    if let Some(description) = event.description.as_deref().filter(|d| !d.is_empty()) {
        html.push_str(&format!("<p>{}</p>\n", escape_html(description)));
    }
    html.push_str("<p>See you there!</p>");

    OutboundEmail {
        from: from.to_string(),
        to: vec![guest.email.clone()],
        subject: format!("You're invited to {}", event.name),
        html,
    }
}

pub struct InvitationDispatcher {
    store: Arc<dyn DeliveryStore>,
    resend: ResendClient,
    from: String,
}

impl InvitationDispatcher {
    pub fn new(store: Arc<dyn DeliveryStore>, resend: ResendClient, from: impl Into<String>) -> Self {
        Self {
            store,
            resend,
            from: from.into(),
        }
    }

    /// Look up the guest and its event, then [`dispatch`](Self::dispatch).
    pub async fn dispatch_invitation(&self, guest_id: &str) -> DeliveryResult<EmailLog> {
        let guest = self
            .store
            .get_guest(guest_id)
            .await?
            .ok_or_else(|| DeliveryError::NotFound(format!("guest {}", guest_id)))?;
        let event = self
            .store
            .get_event(&guest.event_id)
            .await?
            .ok_or_else(|| DeliveryError::NotFound(format!("event {}", guest.event_id)))?;
        self.dispatch(&guest, &event).await
    }

    /// Send the invitation, store its email log as `sent` and make it the
    /// guest's current email.
    pub async fn dispatch(&self, guest: &Guest, event: &Event) -> DeliveryResult<EmailLog> {
        let email = render_invitation(&self.from, guest, event);
        let resend_email_id = self.resend.send(&email).await?;

        let log = self
            .store
            .insert_email_log(&NewEmailLog {
                id: uuid::Uuid::new_v4().to_string(),
                resend_email_id,
                guest_id: Some(guest.id.clone()),
                status: EmailStatus::Sent,
                sent_at: Some(Utc::now()),
            })
            .await?;

        if !self
            .store
            .set_guest_current_email(&guest.id, &log.id, EmailStatus::Sent)
            .await?
        {
            warn!(guest_id = %guest.id, email_log_id = %log.id, "Guest vanished before pointer update");
        }

        info!(
            guest_id = %guest.id,
            event_id = %event.id,
            email_log_id = %log.id,
            resend_email_id = %log.resend_email_id,
            "Invitation dispatched"
        );
        Ok(log)
    }
}
