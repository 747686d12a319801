//! Effect shell around the session reducer.
//!
//! The state lives behind a short-lived `parking_lot` lock that is never
//! held across an `.await`. Each public operation reduces one action and
//! writes the persisted subset under that lock, then runs the remaining
//! effects against the backend and feeds their results back in as actions.

use crate::{
    reduce, Action, Effect, HydrationPhase, Page, PersistedSession, SessionBackend, SessionState,
};
use parking_lot::Mutex;
use partyhaus_database::{Event, EventPatch, Guest, GuestPatch, User};
use partyhaus_storage::ClientStorage;
use std::collections::VecDeque;
use std::sync::Arc;
use supabase_client::{AuthNotification, ChangeNotification};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct SessionStore {
    state: Mutex<SessionState>,
    backend: Arc<dyn SessionBackend>,
    storage: ClientStorage,
}

impl SessionStore {
    pub fn new(backend: Arc<dyn SessionBackend>, storage: ClientStorage) -> Self {
        Self {
            state: Mutex::new(SessionState::default()),
            backend,
            storage,
        }
    }

    // ==========================================
    // Effect shell
    // ==========================================

    /// Reduce one action and write the persisted subset if it changed.
    ///
    /// The write happens under the state lock, so storage always receives
    /// snapshots in reduction order.
    fn apply(&self, action: Action) -> Vec<Effect> {
        let mut state = self.state.lock();
        let effects = reduce(&mut state, action);
        for effect in &effects {
            if let Effect::Persist(persisted) = effect {
                self.persist(persisted);
            }
        }
        effects
    }

    fn persist(&self, persisted: &PersistedSession) {
        if let Err(e) = self.storage.save_session(persisted) {
            warn!(error = %e, "Failed to persist session state");
        }
    }

    /// Run an action and every follow-up action its effects produce.
    async fn run(&self, action: Action) {
        let mut queue = VecDeque::from([action]);
        while let Some(action) = queue.pop_front() {
            for effect in self.apply(action) {
                match effect {
                    Effect::Persist(_) => {}
                    Effect::FetchGuests(ticket) => {
                        let result = self
                            .backend
                            .fetch_guests(&ticket.event_id)
                            .await
                            .map_err(|e| e.to_string());
                        queue.push_back(Action::GuestsFetched { ticket, result });
                    }
                    Effect::FetchEvents {
                        host_id,
                        generation,
                    } => {
                        let result = self
                            .backend
                            .fetch_events(&host_id)
                            .await
                            .map_err(|e| e.to_string());
                        queue.push_back(Action::EventsFetched { generation, result });
                    }
                    Effect::SignOut => {
                        self.spawn_sign_out();
                    }
                }
            }
        }
    }

    fn spawn_sign_out(&self) -> Option<JoinHandle<()>> {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!("No runtime for remote sign-out, skipping");
            return None;
        };
        let backend = self.backend.clone();
        Some(handle.spawn(async move {
            match backend.sign_out().await {
                Ok(()) => debug!("Remote sign-out completed"),
                Err(e) => warn!(error = %e, "Remote sign-out failed, local state already cleared"),
            }
        }))
    }

    // ==========================================
    // Operations
    // ==========================================

    /// Load the persisted subset once at startup and heal it if stale.
    pub async fn rehydrate(&self) -> HydrationPhase {
        let persisted = match self.storage.load_session::<PersistedSession>() {
            Ok(persisted) => persisted,
            Err(e) => {
                warn!(error = %e, "Discarding unreadable persisted session");
                None
            }
        };
        self.run(Action::Rehydrated(persisted)).await;
        let phase = self.phase();
        info!(phase = ?phase, "Session store rehydrated");
        phase
    }

    /// `None` runs the logout cascade.
    pub async fn set_user(&self, user: Option<User>) {
        self.run(Action::SetUser(user)).await;
    }

    pub async fn set_current_page(&self, page: Page) {
        self.run(Action::SetCurrentPage(page)).await;
    }

    pub async fn set_events(&self, events: Vec<Event>) {
        self.run(Action::SetEvents(events)).await;
    }

    pub async fn add_event(&self, event: Event) {
        self.run(Action::AddEvent(event)).await;
    }

    pub async fn update_event(&self, id: &str, patch: EventPatch) {
        self.run(Action::UpdateEvent {
            id: id.to_string(),
            patch,
        })
        .await;
    }

    pub async fn remove_event(&self, id: &str) {
        self.run(Action::RemoveEvent(id.to_string())).await;
    }

    pub async fn add_guest(&self, guest: Guest) {
        self.run(Action::AddGuest(guest)).await;
    }

    pub async fn update_guest(&self, id: &str, patch: GuestPatch) {
        self.run(Action::UpdateGuest {
            id: id.to_string(),
            patch,
        })
        .await;
    }

    pub async fn remove_guest(&self, id: &str) {
        self.run(Action::RemoveGuest(id.to_string())).await;
    }

    pub async fn set_guests(&self, guests: Vec<Guest>) {
        self.run(Action::SetGuests(guests)).await;
    }

    /// Select an event. The first selection of an event loads its guests;
    /// a newer selection supersedes a fetch still in flight.
    pub async fn set_current_event(&self, event: Option<Event>) {
        self.run(Action::SetCurrentEvent(event)).await;
    }

    /// Re-fetch the user's events. Also the retry path while healing.
    pub async fn refresh_events(&self) {
        self.run(Action::RefreshEvents).await;
    }

    /// Clear local state now and sign out remotely in the background.
    ///
    /// Returns the sign-out task so callers that are about to exit can wait
    /// for it; its failure never touches local state.
    pub fn logout(&self) -> Option<JoinHandle<()>> {
        let effects = self.apply(Action::Logout);
        info!("Session cleared");
        if effects.contains(&Effect::SignOut) {
            self.spawn_sign_out()
        } else {
            None
        }
    }

    pub async fn handle_auth_notification(&self, notification: AuthNotification) {
        match notification {
            AuthNotification::SignedIn(user) => {
                info!(user_id = %user.id, "Signed in");
                self.run(Action::SignedIn(user)).await;
            }
            AuthNotification::SignedOut => {
                info!("Signed out");
                self.run(Action::SignedOut).await;
            }
        }
    }

    pub async fn apply_change(&self, change: ChangeNotification) {
        self.run(Action::Change(change)).await;
    }

    /// Feed auth notifications into the store until the sender goes away.
    pub fn spawn_auth_listener(
        self: &Arc<Self>,
        mut notifications: broadcast::Receiver<AuthNotification>,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            loop {
                match notifications.recv().await {
                    Ok(notification) => store.handle_auth_notification(notification).await,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Auth notifications lagged");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("Auth listener stopped");
        })
    }

    /// Feed realtime changes into the store until the feed closes.
    pub fn spawn_change_listener(
        self: &Arc<Self>,
        mut changes: mpsc::UnboundedReceiver<ChangeNotification>,
    ) -> JoinHandle<()> {
        let store = self.clone();
        tokio::spawn(async move {
            while let Some(change) = changes.recv().await {
                store.apply_change(change).await;
            }
            debug!("Change listener stopped");
        })
    }

    // ==========================================
    // Selectors
    // ==========================================

    pub fn snapshot(&self) -> SessionState {
        self.state.lock().clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state.lock().user.clone()
    }

    pub fn current_page(&self) -> Page {
        self.state.lock().current_page.clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.state.lock().renderable_events().to_vec()
    }

    pub fn guests_for_event(&self, event_id: &str) -> Vec<Guest> {
        self.state.lock().guests_for_event(event_id)
    }

    /// Absent while healing.
    pub fn renderable_current_event(&self) -> Option<Event> {
        self.state.lock().renderable_current_event().cloned()
    }

    pub fn phase(&self) -> HydrationPhase {
        self.state.lock().phase
    }

    pub fn is_ready(&self) -> bool {
        self.state.lock().is_ready()
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().is_loading
    }

    pub fn error(&self) -> Option<String> {
        self.state.lock().error.clone()
    }
}
