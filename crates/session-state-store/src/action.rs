//! Inputs to the session reducer and the side effects it asks for.

use crate::{FetchTicket, Page, PersistedSession};
use partyhaus_database::{Event, EventPatch, Guest, GuestPatch, User};
use supabase_client::ChangeNotification;

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Persisted subset loaded at process start (`None` when nothing stored).
    Rehydrated(Option<PersistedSession>),
    /// `None` runs the logout cascade, including the remote sign-out.
    SetUser(Option<User>),
    SetCurrentPage(Page),
    SetEvents(Vec<Event>),
    AddEvent(Event),
    UpdateEvent { id: String, patch: EventPatch },
    RemoveEvent(String),
    AddGuest(Guest),
    UpdateGuest { id: String, patch: GuestPatch },
    RemoveGuest(String),
    SetGuests(Vec<Guest>),
    /// Select an event; loads its guests on first selection.
    SetCurrentEvent(Option<Event>),
    GuestsFetched {
        ticket: FetchTicket,
        result: Result<Vec<Guest>, String>,
    },
    RefreshEvents,
    EventsFetched {
        generation: u64,
        result: Result<Vec<Event>, String>,
    },
    Logout,
    SignedIn(User),
    /// Remote sign-out already happened; clear locally only.
    SignedOut,
    Change(ChangeNotification),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    FetchGuests(FetchTicket),
    FetchEvents { host_id: String, generation: u64 },
    /// Best-effort remote sign-out.
    SignOut,
    Persist(PersistedSession),
}
