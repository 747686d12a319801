//! Supabase auth: sign-in, sign-up, sign-out and startup session restore.
//!
//! Every auth call returns an explicit result; the startup restore is
//! additionally bounded by a timeout and reports that case as
//! [`SessionRestoreOutcome::TimedOut`] instead of erroring.

use crate::{SupabaseError, SupabaseResult};
use chrono::{Duration as ChronoDuration, Utc};
use partyhaus_database::User;
use partyhaus_storage::{ClientStorage, StoredAuthSession};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Auth state change pushed to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthNotification {
    SignedIn(User),
    SignedOut,
}

/// Result of the bounded startup session check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionRestoreOutcome {
    /// A stored session was verified (or refreshed) with the server.
    Restored(User),
    /// Nothing stored.
    NoSession,
    /// The server rejected the stored session or the call failed.
    AuthError(String),
    /// The server did not answer within the bound.
    TimedOut,
}

/// Token response from `/auth/v1/token` (and auto-confirmed sign-ups).
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: i64,
    user: AuthUser,
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Option<serde_json::Value>,
}

impl AuthUser {
    fn into_user(self) -> User {
        let name = self
            .user_metadata
            .as_ref()
            .and_then(|meta| meta.get("name"))
            .and_then(|name| name.as_str())
            .map(str::to_string);
        User {
            id: self.id,
            email: self.email.unwrap_or_default(),
            name,
        }
    }
}

/// Auth client bound to one Supabase project and one local storage.
pub struct AuthClient {
    http_client: Client,
    supabase_url: String,
    publishable_key: String,
    storage: ClientStorage,
    restore_timeout: Duration,
    notifications: broadcast::Sender<AuthNotification>,
}

impl AuthClient {
    pub fn new(
        supabase_url: &str,
        publishable_key: &str,
        storage: ClientStorage,
        restore_timeout: Duration,
    ) -> Self {
        let (notifications, _) = broadcast::channel(16);
        Self {
            http_client: Client::new(),
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            publishable_key: publishable_key.to_string(),
            storage,
            restore_timeout,
            notifications,
        }
    }

    /// Subscribe to `SIGNED_IN` / `SIGNED_OUT` notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthNotification> {
        self.notifications.subscribe()
    }

    fn notify(&self, notification: AuthNotification) {
        // No receivers is fine.
        let _ = self.notifications.send(notification);
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.supabase_url, path)
    }

    /// Access token of the stored session, if any.
    pub fn access_token(&self) -> SupabaseResult<Option<String>> {
        Ok(self.storage.get_auth_session()?.map(|s| s.access_token))
    }

    fn store_tokens(&self, data: TokenResponse) -> SupabaseResult<User> {
        let expires_at = Utc::now() + ChronoDuration::seconds(data.expires_in);
        let user = data.user.into_user();
        self.storage.set_auth_session(&StoredAuthSession {
            access_token: data.access_token,
            refresh_token: data.refresh_token,
            user_id: user.id.clone(),
            email: Some(user.email.clone()).filter(|e| !e.is_empty()),
            expires_at: expires_at.to_rfc3339(),
        })?;
        Ok(user)
    }

    /// Email/password sign-in. Stores the session and emits `SignedIn`.
    pub async fn sign_in_with_password(&self, email: &str, password: &str) -> SupabaseResult<User> {
        let login_url = self.auth_url("token?grant_type=password");
        debug!(url = %login_url, email = %email, "Attempting email/password login");

        let response = self
            .http_client
            .post(&login_url)
            .header("apikey", &self.publishable_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Login failed");
            return Err(if status.is_server_error() {
                SupabaseError::Api {
                    status: status.as_u16(),
                    message: body,
                }
            } else {
                SupabaseError::InvalidCredentials(format!("HTTP {}: {}", status, body))
            });
        }

        let data: TokenResponse = response.json().await?;
        let user = self.store_tokens(data)?;
        info!(user_id = %user.id, "Login successful");
        self.notify(AuthNotification::SignedIn(user.clone()));
        Ok(user)
    }

    /// Create an account. When the project auto-confirms, the returned
    /// session is stored and `SignedIn` is emitted; otherwise the user must
    /// confirm by email first.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> SupabaseResult<User> {
        let response = self
            .http_client
            .post(self.auth_url("signup"))
            .header("apikey", &self.publishable_key)
            .json(&serde_json::json!({
                "email": email,
                "password": password,
                "data": { "name": name },
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Sign-up failed");
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let body: serde_json::Value = response.json().await?;
        if body.get("access_token").is_some() {
            let data: TokenResponse = serde_json::from_value(body)?;
            let user = self.store_tokens(data)?;
            info!(user_id = %user.id, "Sign-up complete, session issued");
            self.notify(AuthNotification::SignedIn(user.clone()));
            return Ok(user);
        }

        let user_json = body.get("user").cloned().unwrap_or(body);
        let user: AuthUser = serde_json::from_value(user_json)?;
        let user = user.into_user();
        info!(user_id = %user.id, "Sign-up pending email confirmation");
        Ok(user)
    }

    /// Revoke the session server-side and clear it locally.
    ///
    /// The local session is cleared and `SignedOut` emitted even when the
    /// server call fails; that failure is still returned.
    pub async fn sign_out(&self) -> SupabaseResult<()> {
        let stored = self.storage.get_auth_session()?;
        self.storage.clear_auth_session()?;
        self.notify(AuthNotification::SignedOut);

        let Some(session) = stored else {
            return Ok(());
        };

        let response = self
            .http_client
            .post(self.auth_url("logout"))
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", session.access_token))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            warn!(status = %status, "Server-side sign-out failed");
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: "sign-out rejected".to_string(),
            });
        }

        info!(user_id = %session.user_id, "Signed out");
        Ok(())
    }

    /// Restore the stored session at startup, bounded by the configured
    /// timeout. Never errors: every failure is folded into the outcome.
    pub async fn restore_session(&self) -> SessionRestoreOutcome {
        match tokio::time::timeout(self.restore_timeout, self.restore_session_inner()).await {
            Ok(Ok(Some(user))) => {
                info!(user_id = %user.id, "Session restored");
                SessionRestoreOutcome::Restored(user)
            }
            Ok(Ok(None)) => {
                info!("No existing session found on startup");
                SessionRestoreOutcome::NoSession
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Session restore failed");
                SessionRestoreOutcome::AuthError(e.to_string())
            }
            Err(_) => {
                warn!(
                    timeout_ms = self.restore_timeout.as_millis() as u64,
                    "Session restore timed out, continuing without session"
                );
                SessionRestoreOutcome::TimedOut
            }
        }
    }

    async fn restore_session_inner(&self) -> SupabaseResult<Option<User>> {
        let Some(session) = self.storage.get_auth_session()? else {
            return Ok(None);
        };

        if session.is_expired() {
            info!(user_id = %session.user_id, "Stored session expired, refreshing");
            return self.refresh(&session.refresh_token).await.map(Some);
        }

        self.verify_with_server(&session.access_token).await.map(Some)
    }

    async fn verify_with_server(&self, access_token: &str) -> SupabaseResult<User> {
        let response = self
            .http_client
            .get(self.auth_url("user"))
            .header("apikey", &self.publishable_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            warn!(status = %status, "Server rejected stored session, clearing it");
            self.storage.clear_auth_session()?;
            return Err(SupabaseError::SessionInvalid(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: "session verification failed".to_string(),
            });
        }

        let user: AuthUser = response.json().await?;
        Ok(user.into_user())
    }

    async fn refresh(&self, refresh_token: &str) -> SupabaseResult<User> {
        let response = self
            .http_client
            .post(self.auth_url("token?grant_type=refresh_token"))
            .header("apikey", &self.publishable_key)
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            self.storage.clear_auth_session()?;
            return Err(SupabaseError::SessionInvalid(format!(
                "refresh rejected: HTTP {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(SupabaseError::Api {
                status: status.as_u16(),
                message: "token refresh failed".to_string(),
            });
        }

        let data: TokenResponse = response.json().await?;
        self.store_tokens(data)
    }
}
