//! Durable record access for the delivery reducer and invitation dispatch.

use crate::DeliveryResult;
use async_trait::async_trait;
use partyhaus_database::{
    queries, AsyncDatabase, EmailEvent, EmailLog, EmailLogUpdate, EmailStatus, Event, Guest,
    NewEmailEvent, NewEmailLog,
};
use supabase_client::SupabaseClient;

/// Storage seam for email logs, their audit rows and the guest pointer.
///
/// Every method is a single-row operation; implementations must make each
/// one atomic on its own.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn find_email_log_by_resend_id(
        &self,
        resend_email_id: &str,
    ) -> DeliveryResult<Option<EmailLog>>;

    /// Returns false when no row was updated.
    async fn update_email_log(&self, id: &str, update: &EmailLogUpdate) -> DeliveryResult<bool>;

    async fn append_email_event(&self, event: &NewEmailEvent) -> DeliveryResult<EmailEvent>;

    /// Set the guest's denormalized email status only while
    /// `current_email_log_id` still equals `email_log_id`.
    async fn update_guest_email_status_if_current(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> DeliveryResult<bool>;

    async fn get_guest(&self, id: &str) -> DeliveryResult<Option<Guest>>;

    async fn get_event(&self, id: &str) -> DeliveryResult<Option<Event>>;

    async fn insert_email_log(&self, log: &NewEmailLog) -> DeliveryResult<EmailLog>;

    /// Point the guest at a new email log and reset its status.
    async fn set_guest_current_email(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> DeliveryResult<bool>;
}

/// Local SQLite records behind the single-thread executor.
#[derive(Clone)]
pub struct SqliteDeliveryStore {
    db: AsyncDatabase,
}

impl SqliteDeliveryStore {
    pub fn new(db: AsyncDatabase) -> Self {
        Self { db }
    }

    pub fn database(&self) -> &AsyncDatabase {
        &self.db
    }
}

#[async_trait]
impl DeliveryStore for SqliteDeliveryStore {
    async fn find_email_log_by_resend_id(
        &self,
        resend_email_id: &str,
    ) -> DeliveryResult<Option<EmailLog>> {
        let resend_email_id = resend_email_id.to_string();
        Ok(self
            .db
            .call(move |conn| queries::get_email_log_by_resend_id(conn, &resend_email_id))
            .await?)
    }

    async fn update_email_log(&self, id: &str, update: &EmailLogUpdate) -> DeliveryResult<bool> {
        let id = id.to_string();
        let update = update.clone();
        Ok(self
            .db
            .call(move |conn| queries::update_email_log(conn, &id, &update))
            .await?)
    }

    async fn append_email_event(&self, event: &NewEmailEvent) -> DeliveryResult<EmailEvent> {
        let event = event.clone();
        Ok(self
            .db
            .call(move |conn| queries::insert_email_event(conn, &event))
            .await?)
    }

    async fn update_guest_email_status_if_current(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> DeliveryResult<bool> {
        let guest_id = guest_id.to_string();
        let email_log_id = email_log_id.to_string();
        Ok(self
            .db
            .call(move |conn| {
                queries::update_guest_email_status_if_current(conn, &guest_id, &email_log_id, status)
            })
            .await?)
    }

    async fn get_guest(&self, id: &str) -> DeliveryResult<Option<Guest>> {
        let id = id.to_string();
        Ok(self.db.call(move |conn| queries::get_guest(conn, &id)).await?)
    }

    async fn get_event(&self, id: &str) -> DeliveryResult<Option<Event>> {
        let id = id.to_string();
        Ok(self.db.call(move |conn| queries::get_event(conn, &id)).await?)
    }

    async fn insert_email_log(&self, log: &NewEmailLog) -> DeliveryResult<EmailLog> {
        let log = log.clone();
        Ok(self
            .db
            .call(move |conn| queries::insert_email_log(conn, &log))
            .await?)
    }

    async fn set_guest_current_email(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> DeliveryResult<bool> {
        let guest_id = guest_id.to_string();
        let email_log_id = email_log_id.to_string();
        Ok(self
            .db
            .call(move |conn| {
                queries::set_guest_current_email(conn, &guest_id, &email_log_id, status)
            })
            .await?)
    }
}

/// Hosted records through the Supabase REST API (service-role client).
#[derive(Clone)]
pub struct SupabaseDeliveryStore {
    client: SupabaseClient,
}

impl SupabaseDeliveryStore {
    pub fn new(client: SupabaseClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DeliveryStore for SupabaseDeliveryStore {
    async fn find_email_log_by_resend_id(
        &self,
        resend_email_id: &str,
    ) -> DeliveryResult<Option<EmailLog>> {
        Ok(self.client.get_email_log_by_resend_id(resend_email_id).await?)
    }

    async fn update_email_log(&self, id: &str, update: &EmailLogUpdate) -> DeliveryResult<bool> {
        Ok(self.client.update_email_log(id, update).await?)
    }

    async fn append_email_event(&self, event: &NewEmailEvent) -> DeliveryResult<EmailEvent> {
        Ok(self.client.insert_email_event(event).await?)
    }

    async fn update_guest_email_status_if_current(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> DeliveryResult<bool> {
        Ok(self
            .client
            .update_guest_email_status_if_current(guest_id, email_log_id, status)
            .await?)
    }

    async fn get_guest(&self, id: &str) -> DeliveryResult<Option<Guest>> {
        Ok(self.client.get_guest(id).await?)
    }

    async fn get_event(&self, id: &str) -> DeliveryResult<Option<Event>> {
        Ok(self.client.get_event(id).await?)
    }

    async fn insert_email_log(&self, log: &NewEmailLog) -> DeliveryResult<EmailLog> {
        Ok(self.client.insert_email_log(log).await?)
    }

    async fn set_guest_current_email(
        &self,
        guest_id: &str,
        email_log_id: &str,
        status: EmailStatus,
    ) -> DeliveryResult<bool> {
        Ok(self
            .client
            .set_guest_current_email(guest_id, email_log_id, status)
            .await?)
    }
}
