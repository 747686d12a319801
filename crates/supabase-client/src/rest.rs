//! Supabase REST (PostgREST) client for the PartyHaus tables.

use crate::{summarize_response_body, SupabaseError, SupabaseResult};
use partyhaus_database::{
    EmailEvent, EmailLog, EmailLogUpdate, EmailStatus, Event, Guest, NewEmailEvent, NewEmailLog,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// REST client. The bearer token decides which rows PostgREST exposes: the
/// user's access token for client reads, the service role key for the
/// webhook server.
#[derive(Clone)]
pub struct SupabaseClient {
    http_client: reqwest::Client,
    api_url: String,
    api_key: String,
    bearer: String,
}

impl SupabaseClient {
    /// Create a client that authenticates with `api_key` alone.
    ///
    /// # Arguments
    /// * `api_url` - The Supabase project URL (e.g., `https://xyz.supabase.co`)
    /// * `api_key` - Publishable key, or the service role key on the server
    pub fn new(api_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        let api_key = api_key.into();
        Self {
            http_client: reqwest::Client::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
            bearer: api_key.clone(),
            api_key,
        }
    }

    /// Same client, acting as the signed-in user.
    pub fn with_access_token(&self, access_token: impl Into<String>) -> Self {
        Self {
            bearer: access_token.into(),
            ..self.clone()
        }
    }

    /// Build the REST API URL for a table.
    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.api_url, table)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http_client
            .request(method, self.rest_url(table))
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.bearer))
            .header("Accept", "application/json")
    }

    async fn ensure_success(
        response: reqwest::Response,
        context: &'static str,
    ) -> SupabaseResult<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let body_summary = summarize_response_body(&body);
        error!(status = %status, body_summary = %body_summary, "{}", context);
        Err(SupabaseError::Api {
            status: status.as_u16(),
            message: format!("{} ({})", context, body_summary),
        })
    }

    async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        context: &'static str,
    ) -> SupabaseResult<Vec<T>> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(&[("select", "*")])
            .query(filters)
            .send()
            .await?;
        let response = Self::ensure_success(response, context).await?;
        Ok(response.json().await?)
    }

    async fn insert<B: Serialize, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        context: &'static str,
    ) -> SupabaseResult<T> {
        let response = self
            .request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let response = Self::ensure_success(response, context).await?;
        let rows: Vec<T> = response.json().await?;
        rows.into_iter()
            .next()
            .ok_or_else(|| SupabaseError::Decode(format!("{}: empty insert response", context)))
    }

    /// PATCH the rows matching `filters`; returns how many rows changed.
    async fn update<B: Serialize>(
        &self,
        table: &str,
        filters: &[(&str, String)],
        body: &B,
        context: &'static str,
    ) -> SupabaseResult<usize> {
        let response = self
            .request(reqwest::Method::PATCH, table)
            .header("Prefer", "return=representation")
            .query(filters)
            .json(body)
            .send()
            .await?;
        let response = Self::ensure_success(response, context).await?;
        let rows: Vec<serde_json::Value> = response.json().await?;
        Ok(rows.len())
    }

    // ==========================================
    // Events
    // ==========================================

    pub async fn list_events_for_host(&self, host_id: &str) -> SupabaseResult<Vec<Event>> {
        let events: Vec<Event> = self
            .select(
                "events",
                &[
                    ("host_id", format!("eq.{}", host_id)),
                    ("order", "event_date.asc".to_string()),
                ],
                "Failed to fetch events",
            )
            .await?;
        debug!(host_id, count = events.len(), "Fetched events");
        Ok(events)
    }

    pub async fn get_event(&self, id: &str) -> SupabaseResult<Option<Event>> {
        let events: Vec<Event> = self
            .select(
                "events",
                &[("id", format!("eq.{}", id)), ("limit", "1".to_string())],
                "Failed to fetch event",
            )
            .await?;
        Ok(events.into_iter().next())
    }

    // ==========================================
    // Guests
    // ==========================================

    pub async fn list_guests_for_event(&self, event_id: &str) -> SupabaseResult<Vec<Guest>> {
        let guests: Vec<Guest> = self
            .select(
                "guests",
                &[("event_id", format!("eq.{}", event_id))],
                "Failed to fetch guests",
            )
            .await?;
        debug!(event_id, count = guests.len(), "Fetched guests");
        Ok(guests)
    }

    pub async fn get_guest(&self, id: &str) -> SupabaseResult<Option<Guest>> {
        let guests: Vec<Guest> = self
            .select(
                "guests",
                &[("id", format!("eq.{}", id)), ("limit", "1".to_string())],
                "Failed to fetch guest",
            )
            .await?;
        Ok(guests.into_iter().next())
    }

    /// Point a guest at a freshly dispatched email log.
    pub async fn set_guest_current_email(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> SupabaseResult<bool> {
        let changed = self
            .update(
                "guests",
                &[("id", format!("eq.{}", guest_id))],
                &serde_json::json!({
                    "current_email_log_id": email_log_id,
                    "email_status": status,
                }),
                "Failed to update guest email pointer",
            )
            .await?;
        Ok(changed > 0)
    }

    /// Update the guest's denormalized email status only while the guest
    /// still points at `email_log_id`. The pointer check is part of the
    /// PATCH filter, so it is one atomic row update.
    pub async fn update_guest_email_status_if_current(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> SupabaseResult<bool> {
        let changed = self
            .update(
                "guests",
                &[
                    ("id", format!("eq.{}", guest_id)),
                    ("current_email_log_id", format!("eq.{}", email_log_id)),
                ],
                &serde_json::json!({ "email_status": status }),
                "Failed to update guest email status",
            )
            .await?;
        Ok(changed > 0)
    }

    // ==========================================
    // Email logs and events
    // ==========================================

    pub async fn get_email_log_by_resend_id(
        &self,
        resend_email_id: &str,
    ) -> SupabaseResult<Option<EmailLog>> {
        let logs: Vec<EmailLog> = self
            .select(
                "email_logs",
                &[
                    ("resend_email_id", format!("eq.{}", resend_email_id)),
                    ("limit", "1".to_string()),
                ],
                "Failed to fetch email log",
            )
            .await?;
        Ok(logs.into_iter().next())
    }

    pub async fn insert_email_log(&self, log: &NewEmailLog) -> SupabaseResult<EmailLog> {
        self.insert("email_logs", log, "Failed to insert email log")
            .await
    }

    pub async fn update_email_log(&self, id: &str, update: &EmailLogUpdate) -> SupabaseResult<bool> {
        let changed = self
            .update(
                "email_logs",
                &[("id", format!("eq.{}", id))],
                update,
                "Failed to update email log",
            )
            .await?;
        Ok(changed > 0)
    }

    pub async fn insert_email_event(&self, event: &NewEmailEvent) -> SupabaseResult<EmailEvent> {
        self.insert("email_events", event, "Failed to insert email event")
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn guest_json(id: &str, event_id: &str) -> serde_json::Value {
        serde_json::json!({
            "id": id,
            "event_id": event_id,
            "user_id": null,
            "name": "Ada",
            "email": "ada@example.com",
            "status": "pending",
            "is_checked_in": false
        })
    }

    #[tokio::test]
    async fn list_guests_sends_filter_and_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/guests"))
            .and(query_param("event_id", "eq.e1"))
            .and(header("apikey", "anon"))
            .and(header("Authorization", "Bearer user-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([guest_json("g1", "e1")])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = SupabaseClient::new(server.uri(), "anon").with_access_token("user-token");
        let guests = client.list_guests_for_event("e1").await.unwrap();
        assert_eq!(guests.len(), 1);
        assert_eq!(guests[0].id, "g1");
    }

    #[tokio::test]
    async fn missing_email_log_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/email_logs"))
            .and(query_param("resend_email_id", "eq.em_missing"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(server.uri(), "service-role");
        assert!(client
            .get_email_log_by_resend_id("em_missing")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn server_error_is_transient_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .respond_with(ResponseTemplate::new(503).set_body_string("upstream down"))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(server.uri(), "anon");
        let err = client.list_events_for_host("u1").await.unwrap_err();
        assert!(matches!(err, SupabaseError::Api { status: 503, .. }));
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn guarded_guest_update_reports_no_match() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/guests"))
            .and(query_param("id", "eq.g1"))
            .and(query_param("current_email_log_id", "eq.l-old"))
            .and(body_partial_json(serde_json::json!({"email_status": "delivered"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(server.uri(), "service-role");
        let updated = client
            .update_guest_email_status_if_current("g1", "l-old", EmailStatus::Delivered)
            .await
            .unwrap();
        assert!(!updated);
    }

    #[tokio::test]
    async fn email_log_update_sends_only_set_fields() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path("/rest/v1/email_logs"))
            .and(query_param("id", "eq.l1"))
            .and(header("Prefer", "return=representation"))
            .and(body_partial_json(serde_json::json!({
                "status": "bounced",
                "error_message": "mailbox full"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!([{"id": "l1"}])),
            )
            .mount(&server)
            .await;

        let client = SupabaseClient::new(server.uri(), "service-role");
        let updated = client
            .update_email_log(
                "l1",
                &EmailLogUpdate {
                    status: Some(EmailStatus::Bounced),
                    bounced_at: Some(chrono::Utc::now()),
                    error_message: Some("mailbox full".to_string()),
                    webhook_data: serde_json::json!({"type": "email.bounced"}),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(updated);
    }

    #[tokio::test]
    async fn empty_insert_response_is_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/email_events"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = SupabaseClient::new(format!("{}/", server.uri()), "service-role");
        let err = client
            .insert_email_event(&NewEmailEvent {
                id: "ev1".into(),
                email_log_id: "l1".into(),
                resend_email_id: "em_1".into(),
                event_type: "email.sent".into(),
                timestamp: chrono::Utc::now(),
                webhook_data: serde_json::json!({}),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, SupabaseError::Decode(_)));
    }
}
