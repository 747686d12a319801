//! Pure session state transitions.
//!
//! `reduce` mutates the state in place and returns the effects the shell
//! must run. It does no I/O; fetch results come back in as actions.

use crate::{
    Action, Effect, FetchTicket, HydrationInput, HydrationPhase, Page, PersistedSession,
    SessionState,
};
use partyhaus_database::{Event, Guest, User};
use supabase_client::{ChangeEventType, ChangeNotification};
use tracing::{debug, info, warn};

pub fn reduce(state: &mut SessionState, action: Action) -> Vec<Effect> {
    let persisted_before = state.persisted();
    let mut effects = Vec::new();

    match action {
        Action::Rehydrated(persisted) => rehydrate(state, persisted, &mut effects),
        Action::SetUser(Some(user)) => state.user = Some(user),
        Action::SetUser(None) | Action::Logout => {
            clear_session(state);
            effects.push(Effect::SignOut);
        }
        Action::SignedOut => clear_session(state),
        Action::SignedIn(user) => sign_in(state, user, &mut effects),
        Action::SetCurrentPage(page) => state.current_page = page,
        Action::SetEvents(events) => state.events = events,
        Action::AddEvent(event) => upsert_event(state, event),
        Action::UpdateEvent { id, patch } => match state.event_index(&id) {
            Some(idx) => state.events[idx].apply(&patch),
            None => debug!(event_id = %id, "Update for unknown event ignored"),
        },
        Action::RemoveEvent(id) => remove_event(state, &id),
        Action::AddGuest(guest) => upsert_guest(state, guest),
        Action::UpdateGuest { id, patch } => match state.guest_index(&id) {
            Some(idx) => state.guests[idx].apply(&patch),
            None => debug!(guest_id = %id, "Update for unknown guest ignored"),
        },
        Action::RemoveGuest(id) => state.guests.retain(|g| g.id != id),
        Action::SetGuests(guests) => state.guests = guests,
        Action::SetCurrentEvent(event) => select_event(state, event, &mut effects),
        Action::GuestsFetched { ticket, result } => guests_fetched(state, ticket, result),
        Action::RefreshEvents => request_events(state, &mut effects),
        Action::EventsFetched { generation, result } => {
            events_fetched(state, generation, result, &mut effects)
        }
        Action::Change(change) => apply_change(state, change),
    }

    enforce_consistency(state, &mut effects);
    state.sync_loading();

    let persisted_after = state.persisted();
    if persisted_after != persisted_before {
        // Persist first so the stored subset is current before any remote call.
        effects.insert(0, Effect::Persist(persisted_after));
    }
    effects
}

fn rehydrate(
    state: &mut SessionState,
    persisted: Option<PersistedSession>,
    effects: &mut Vec<Effect>,
) {
    if state.phase != HydrationPhase::Cold {
        warn!(phase = ?state.phase, "Ignoring rehydration after startup");
        return;
    }
    if let Some(persisted) = persisted {
        state.user = persisted.user;
        state.current_page = persisted.current_page;
        state.current_event = persisted.current_event;
        state.events = persisted.events;
    }

    if state.is_consistent() {
        state.phase.advance(HydrationInput::Consistent);
        load_current_guests(state, effects);
        debug!(events = state.events.len(), "Rehydrated session");
    } else {
        info!(
            current_event = ?state.current_event.as_ref().map(|e| &e.id),
            events = state.events.len(),
            "Persisted current event is stale, healing"
        );
        begin_healing(state, effects);
    }
}

/// Local logout cascade.
fn clear_session(state: &mut SessionState) {
    state.user = None;
    state.current_event = None;
    state.events.clear();
    state.guests.clear();
    state.loaded_event_ids.clear();
    state.fetching = None;
    state.events_fetch = None;
    state.error = None;
    state.current_page = Page::auth();
    state.phase.settle();
}

fn sign_in(state: &mut SessionState, user: User, effects: &mut Vec<Effect>) {
    let switched = state.user.as_ref().is_some_and(|u| u.id != user.id);
    if switched {
        // Cached events and guests belong to the previous identity.
        state.current_event = None;
        state.events.clear();
        state.guests.clear();
        state.loaded_event_ids.clear();
        state.fetching = None;
    }
    state.user = Some(user);
    request_events(state, effects);
}

fn upsert_event(state: &mut SessionState, event: Event) {
    match state.event_index(&event.id) {
        Some(idx) => state.events[idx] = event,
        None => state.events.push(event),
    }
}

fn upsert_guest(state: &mut SessionState, guest: Guest) {
    match state.guest_index(&guest.id) {
        Some(idx) => state.guests[idx] = guest,
        None => state.guests.push(guest),
    }
}

fn remove_event(state: &mut SessionState, id: &str) {
    state.events.retain(|e| e.id != id);
    state.guests.retain(|g| g.event_id != id);
    state.loaded_event_ids.remove(id);
    if state.fetching_event_id() == Some(id) {
        state.fetching = None;
    }
}

fn select_event(state: &mut SessionState, event: Option<Event>, effects: &mut Vec<Effect>) {
    state.current_event = event;
    load_current_guests(state, effects);
}

/// Start a guest fetch for the current event unless it is loaded or
/// already being fetched. A fetch for another event is superseded.
fn load_current_guests(state: &mut SessionState, effects: &mut Vec<Effect>) {
    let Some(event_id) = state.current_event.as_ref().map(|e| e.id.clone()) else {
        return;
    };
    if state.loaded_event_ids.contains(&event_id) || state.fetching_event_id() == Some(&event_id)
    {
        return;
    }
    if let Some(previous) = &state.fetching {
        debug!(
            superseded = %previous.event_id,
            event_id = %event_id,
            "Superseding guest fetch"
        );
    }
    state.fetch_generation += 1;
    let ticket = FetchTicket {
        event_id,
        generation: state.fetch_generation,
    };
    state.fetching = Some(ticket.clone());
    effects.push(Effect::FetchGuests(ticket));
}

fn guests_fetched(
    state: &mut SessionState,
    ticket: FetchTicket,
    result: Result<Vec<Guest>, String>,
) {
    if state.fetching.as_ref() != Some(&ticket) {
        debug!(
            event_id = %ticket.event_id,
            generation = ticket.generation,
            "Discarding superseded guest fetch"
        );
        return;
    }
    state.fetching = None;
    match result {
        Ok(guests) => {
            state.guests.retain(|g| g.event_id != ticket.event_id);
            state
                .guests
                .extend(guests.into_iter().filter(|g| g.event_id == ticket.event_id));
            state.loaded_event_ids.insert(ticket.event_id);
            state.error = None;
        }
        Err(message) => {
            warn!(event_id = %ticket.event_id, error = %message, "Guest fetch failed");
            state.error = Some(message);
        }
    }
}

fn request_events(state: &mut SessionState, effects: &mut Vec<Effect>) {
    let Some(host_id) = state.user.as_ref().map(|u| u.id.clone()) else {
        debug!("No user, skipping events fetch");
        return;
    };
    state.events_generation += 1;
    state.events_fetch = Some(state.events_generation);
    effects.push(Effect::FetchEvents {
        host_id,
        generation: state.events_generation,
    });
}

fn events_fetched(
    state: &mut SessionState,
    generation: u64,
    result: Result<Vec<Event>, String>,
    effects: &mut Vec<Effect>,
) {
    if state.events_fetch != Some(generation) {
        debug!(generation, "Discarding stale events fetch");
        return;
    }
    state.events_fetch = None;
    match result {
        Ok(events) => {
            state.error = None;
            state.events = events;
            // A fresh list is authoritative: keep the current event only if
            // it is still there.
            if !state.is_consistent() {
                info!(
                    current_event = ?state.current_event.as_ref().map(|e| &e.id),
                    "Current event no longer exists, falling back to dashboard"
                );
                state.current_event = None;
                state.current_page = Page::dashboard();
            }
            if state.phase == HydrationPhase::Healing {
                state.phase.advance(HydrationInput::Healed);
                info!("Session healed");
            }
            load_current_guests(state, effects);
        }
        Err(message) => {
            warn!(error = %message, "Events fetch failed");
            state.error = Some(message);
        }
    }
}

fn begin_healing(state: &mut SessionState, effects: &mut Vec<Effect>) {
    state.phase.advance(HydrationInput::StaleDetected);
    if state.user.is_some() {
        request_events(state, effects);
    } else {
        // Nobody to fetch events for: drop the stale selection.
        state.current_event = None;
        state.current_page = Page::auth();
        state.phase.advance(HydrationInput::Healed);
    }
}

/// Keep `current_event` pointing at the listed copy, and heal if it fell
/// out of the list.
fn enforce_consistency(state: &mut SessionState, effects: &mut Vec<Effect>) {
    let Some(current_id) = state.current_event.as_ref().map(|e| e.id.clone()) else {
        return;
    };
    match state.event_index(&current_id) {
        Some(idx) => {
            if state.current_event.as_ref() != Some(&state.events[idx]) {
                state.current_event = Some(state.events[idx].clone());
            }
        }
        None if state.phase == HydrationPhase::Ready => {
            info!(event_id = %current_id, "Current event left the events list, healing");
            begin_healing(state, effects);
        }
        None => {}
    }
}

fn apply_change(state: &mut SessionState, change: ChangeNotification) {
    match (change.table.as_str(), change.event_type) {
        ("events", ChangeEventType::Insert | ChangeEventType::Update) => {
            match change.new_record::<Event>() {
                Ok(Some(event)) => upsert_event(state, event),
                Ok(None) => debug!("Event change without a row"),
                Err(e) => warn!(error = %e, "Undecodable event change"),
            }
        }
        ("events", ChangeEventType::Delete) => {
            if let Some(id) = change.record_id().map(str::to_string) {
                remove_event(state, &id);
            }
        }
        ("guests", ChangeEventType::Insert | ChangeEventType::Update) => {
            match change.new_record::<Guest>() {
                Ok(Some(guest)) => upsert_guest(state, guest),
                Ok(None) => debug!("Guest change without a row"),
                Err(e) => warn!(error = %e, "Undecodable guest change"),
            }
        }
        ("guests", ChangeEventType::Delete) => {
            if let Some(id) = change.record_id() {
                state.guests.retain(|g| g.id != id);
            }
        }
        (table, _) => debug!(table, "Change for untracked table ignored"),
    }
}
