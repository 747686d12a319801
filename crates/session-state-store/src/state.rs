//! Session state, its persisted subset and read-side selectors.

use crate::HydrationPhase;
use partyhaus_database::{Event, Guest, User};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Navigation target. Any string is accepted; a few are well known.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Page(String);

impl Page {
    pub const AUTH: &'static str = "auth";
    pub const DASHBOARD: &'static str = "dashboard";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn auth() -> Self {
        Self::new(Self::AUTH)
    }

    pub fn dashboard() -> Self {
        Self::new(Self::DASHBOARD)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::auth()
    }
}

impl std::fmt::Display for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The single authoritative guest fetch. A fetch result is applied only if
/// its ticket equals the one in the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub event_id: String,
    pub generation: u64,
}

/// Subset written to local storage on every change to it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PersistedSession {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub current_page: Page,
    #[serde(default)]
    pub current_event: Option<Event>,
    #[serde(default)]
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    pub user: Option<User>,
    pub current_page: Page,
    pub current_event: Option<Event>,
    pub events: Vec<Event>,
    /// All loaded guests, across events.
    pub guests: Vec<Guest>,
    /// Events whose guest list has been fully fetched.
    pub loaded_event_ids: HashSet<String>,
    /// Guest fetch slot.
    pub fetching: Option<FetchTicket>,
    /// Generation of the in-flight events fetch.
    pub events_fetch: Option<u64>,
    pub is_loading: bool,
    /// Last fetch failure.
    pub error: Option<String>,
    pub phase: HydrationPhase,
    pub(crate) fetch_generation: u64,
    pub(crate) events_generation: u64,
}

impl SessionState {
    pub fn persisted(&self) -> PersistedSession {
        PersistedSession {
            user: self.user.clone(),
            current_page: self.current_page.clone(),
            current_event: self.current_event.clone(),
            events: self.events.clone(),
        }
    }

    /// `fetchingEventId`: the event whose guests are being fetched.
    pub fn fetching_event_id(&self) -> Option<&str> {
        self.fetching.as_ref().map(|t| t.event_id.as_str())
    }

    pub fn is_ready(&self) -> bool {
        self.phase.is_ready()
    }

    pub fn guests_for_event(&self, event_id: &str) -> Vec<Guest> {
        self.guests
            .iter()
            .filter(|g| g.event_id == event_id)
            .cloned()
            .collect()
    }

    /// Current event as the UI may render it: absent until ready.
    pub fn renderable_current_event(&self) -> Option<&Event> {
        if self.is_ready() {
            self.current_event.as_ref()
        } else {
            None
        }
    }

    /// Events as the UI may render them: empty until ready.
    pub fn renderable_events(&self) -> &[Event] {
        if self.is_ready() {
            &self.events
        } else {
            &[]
        }
    }

    /// True when the current event is absent or present in `events`.
    pub fn is_consistent(&self) -> bool {
        match &self.current_event {
            None => true,
            Some(current) => self.events.iter().any(|e| e.id == current.id),
        }
    }

    pub fn event_index(&self, id: &str) -> Option<usize> {
        self.events.iter().position(|e| e.id == id)
    }

    pub fn guest_index(&self, id: &str) -> Option<usize> {
        self.guests.iter().position(|g| g.id == id)
    }

    pub(crate) fn sync_loading(&mut self) {
        self.is_loading = self.fetching.is_some() || self.events_fetch.is_some();
    }
}
