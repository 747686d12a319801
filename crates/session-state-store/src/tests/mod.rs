//! Behavioural tests for the session store.
//!
//! - `reducer.rs` - pure transitions: collections, fetch slot, healing,
//!   logout cascade, change feed
//! - `shell.rs`   - effect shell: persistence, rehydration, superseded
//!   fetches, remote sign-out, listeners

mod reducer;

use crate::{SessionBackend, StoreError, StoreResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use partyhaus_database::{Event, Guest, GuestStatus, User};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use supabase_client::SupabaseError;
use tokio::sync::Notify;

pub(crate) fn user(id: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        name: None,
    }
}

pub(crate) fn event(id: &str) -> Event {
    Event {
        id: id.to_string(),
        name: format!("Event {}", id),
        description: None,
        location: None,
        event_date: "2026-12-31T20:00:00Z".to_string(),
        host_id: "u1".to_string(),
        is_public: false,
        max_guests: None,
    }
}

pub(crate) fn guest(id: &str, event_id: &str) -> Guest {
    Guest {
        id: id.to_string(),
        event_id: event_id.to_string(),
        user_id: None,
        name: format!("Guest {}", id),
        email: format!("{}@example.com", id),
        status: GuestStatus::Pending,
        is_checked_in: false,
        email_status: None,
        current_email_log_id: None,
    }
}

fn backend_error(message: &str) -> StoreError {
    StoreError::Backend(SupabaseError::Api {
        status: 503,
        message: message.to_string(),
    })
}

/// Scripted backend. Guest fetches for a gated event wait until the gate
/// is opened.
#[derive(Default)]
pub(crate) struct MockBackend {
    events: Mutex<Option<Result<Vec<Event>, String>>>,
    guests: Mutex<HashMap<String, Vec<Guest>>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
    fail_sign_out: bool,
    pub event_fetches: AtomicUsize,
    pub guest_fetches: AtomicUsize,
    pub sign_outs: AtomicUsize,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_sign_out() -> Self {
        Self {
            fail_sign_out: true,
            ..Self::default()
        }
    }

    pub fn with_events(self, events: Vec<Event>) -> Self {
        *self.events.lock() = Some(Ok(events));
        self
    }

    pub fn set_events(&self, events: Result<Vec<Event>, String>) {
        *self.events.lock() = Some(events);
    }

    pub fn with_guests(self, event_id: &str, guests: Vec<Guest>) -> Self {
        self.guests.lock().insert(event_id.to_string(), guests);
        self
    }

    /// Hold guest fetches for `event_id` until the returned gate is notified.
    pub fn gate(&self, event_id: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.lock().insert(event_id.to_string(), gate.clone());
        gate
    }

    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionBackend for MockBackend {
    async fn fetch_events(&self, _host_id: &str) -> StoreResult<Vec<Event>> {
        self.event_fetches.fetch_add(1, Ordering::SeqCst);
        let scripted = self.events.lock().clone();
        match scripted {
            Some(Ok(events)) => Ok(events),
            Some(Err(message)) => Err(backend_error(&message)),
            None => Ok(Vec::new()),
        }
    }

    async fn fetch_guests(&self, event_id: &str) -> StoreResult<Vec<Guest>> {
        self.guest_fetches.fetch_add(1, Ordering::SeqCst);
        let gate = self.gates.lock().get(event_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self.guests.lock().get(event_id).cloned().unwrap_or_default())
    }

    async fn sign_out(&self) -> StoreResult<()> {
        self.sign_outs.fetch_add(1, Ordering::SeqCst);
        if self.fail_sign_out {
            return Err(backend_error("sign-out unavailable"));
        }
        Ok(())
    }
}
