//! Remote calls the session store's effects need.

use crate::{StoreError, StoreResult};
use async_trait::async_trait;
use partyhaus_database::{Event, Guest};
use std::sync::Arc;
use supabase_client::{AuthClient, SupabaseClient};

#[async_trait]
pub trait SessionBackend: Send + Sync {
    async fn fetch_events(&self, host_id: &str) -> StoreResult<Vec<Event>>;

    async fn fetch_guests(&self, event_id: &str) -> StoreResult<Vec<Guest>>;

    async fn sign_out(&self) -> StoreResult<()>;
}

/// Backend reading as the signed-in user.
pub struct SupabaseSessionBackend {
    rest: SupabaseClient,
    auth: Arc<AuthClient>,
}

impl SupabaseSessionBackend {
    pub fn new(rest: SupabaseClient, auth: Arc<AuthClient>) -> Self {
        Self { rest, auth }
    }

    fn user_client(&self) -> StoreResult<SupabaseClient> {
        let token = self.auth.access_token()?.ok_or(StoreError::NotLoggedIn)?;
        Ok(self.rest.with_access_token(token))
    }
}

#[async_trait]
impl SessionBackend for SupabaseSessionBackend {
    async fn fetch_events(&self, host_id: &str) -> StoreResult<Vec<Event>> {
        Ok(self.user_client()?.list_events_for_host(host_id).await?)
    }

    async fn fetch_guests(&self, event_id: &str) -> StoreResult<Vec<Guest>> {
        Ok(self.user_client()?.list_guests_for_event(event_id).await?)
    }

    async fn sign_out(&self) -> StoreResult<()> {
        Ok(self.auth.sign_out().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use partyhaus_storage::{ClientStorage, MemoryStorage, StoredAuthSession};
    use std::time::Duration;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn auth(server_uri: &str, signed_in: bool) -> Arc<AuthClient> {
        let storage = ClientStorage::new(Arc::new(MemoryStorage::new()));
        if signed_in {
            storage
                .set_auth_session(&StoredAuthSession {
                    access_token: "user-jwt".into(),
                    refresh_token: "refresh".into(),
                    user_id: "u1".into(),
                    email: None,
                    expires_at: "2099-01-01T00:00:00Z".into(),
                })
                .unwrap();
        }
        Arc::new(AuthClient::new(
            server_uri,
            "anon",
            storage,
            Duration::from_secs(5),
        ))
    }

    #[tokio::test]
    async fn fetches_events_with_user_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/events"))
            .and(query_param("host_id", "eq.u1"))
            .and(header("Authorization", "Bearer user-jwt"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": "e1",
                "name": "Launch",
                "event_date": "2026-11-01T18:00:00Z",
                "host_id": "u1"
            }])))
            .mount(&server)
            .await;

        let backend = SupabaseSessionBackend::new(
            SupabaseClient::new(server.uri(), "anon"),
            auth(&server.uri(), true),
        );
        let events = backend.fetch_events("u1").await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].name, "Launch");
    }

    #[tokio::test]
    async fn fetch_without_session_is_not_logged_in() {
        let server = MockServer::start().await;
        let backend = SupabaseSessionBackend::new(
            SupabaseClient::new(server.uri(), "anon"),
            auth(&server.uri(), false),
        );
        let err = backend.fetch_guests("e1").await.unwrap_err();
        assert!(matches!(err, StoreError::NotLoggedIn));
    }
}
