//! Pure reducer transitions.

use super::{event, guest, user};
use crate::{
    reduce, Action, Effect, FetchTicket, HydrationPhase, Page, PersistedSession, SessionState,
};
use partyhaus_database::{EventPatch, GuestPatch, GuestStatus};
use serde_json::json;
use supabase_client::ChangeNotification;

fn ready_state() -> SessionState {
    let mut state = SessionState::default();
    reduce(
        &mut state,
        Action::Rehydrated(Some(PersistedSession {
            user: Some(user("u1")),
            current_page: Page::dashboard(),
            current_event: None,
            events: vec![event("e1"), event("e2")],
        })),
    );
    assert!(state.is_ready());
    state
}

fn fetch_ticket(effects: &[Effect]) -> FetchTicket {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::FetchGuests(ticket) => Some(ticket.clone()),
            _ => None,
        })
        .expect("guest fetch effect")
}

fn events_generation(effects: &[Effect]) -> u64 {
    effects
        .iter()
        .find_map(|e| match e {
            Effect::FetchEvents { generation, .. } => Some(*generation),
            _ => None,
        })
        .expect("events fetch effect")
}

#[test]
fn consistent_rehydration_is_ready_immediately() {
    let mut state = SessionState::default();
    let effects = reduce(
        &mut state,
        Action::Rehydrated(Some(PersistedSession {
            user: Some(user("u1")),
            current_page: Page::new("event-details"),
            current_event: Some(event("e1")),
            events: vec![event("e1")],
        })),
    );

    assert_eq!(state.phase, HydrationPhase::Ready);
    assert_eq!(state.current_page.as_str(), "event-details");
    // Guests are never persisted, so the current event's list is re-fetched.
    assert_eq!(fetch_ticket(&effects).event_id, "e1");
    assert!(state.is_loading);
}

#[test]
fn empty_rehydration_is_ready_on_auth_page() {
    let mut state = SessionState::default();
    let effects = reduce(&mut state, Action::Rehydrated(None));
    assert!(state.is_ready());
    assert_eq!(state.current_page, Page::auth());
    assert!(effects.is_empty());
}

#[test]
fn stale_rehydration_heals_and_restores_current_event() {
    let mut state = SessionState::default();
    let effects = reduce(
        &mut state,
        Action::Rehydrated(Some(PersistedSession {
            user: Some(user("u1")),
            current_page: Page::new("event-details"),
            current_event: Some(event("e1")),
            events: vec![],
        })),
    );

    assert_eq!(state.phase, HydrationPhase::Healing);
    assert!(state.renderable_current_event().is_none());
    let generation = events_generation(&effects);

    let mut refreshed = event("e1");
    refreshed.name = "Renamed".into();
    let effects = reduce(
        &mut state,
        Action::EventsFetched {
            generation,
            result: Ok(vec![refreshed, event("e2")]),
        },
    );

    assert!(state.is_ready());
    assert_eq!(
        state.renderable_current_event().map(|e| e.name.as_str()),
        Some("Renamed")
    );
    assert_eq!(state.current_page.as_str(), "event-details");
    assert_eq!(fetch_ticket(&effects).event_id, "e1");
}

#[test]
fn stale_rehydration_drops_vanished_event_to_dashboard() {
    let mut state = SessionState::default();
    let effects = reduce(
        &mut state,
        Action::Rehydrated(Some(PersistedSession {
            user: Some(user("u1")),
            current_page: Page::new("event-details"),
            current_event: Some(event("gone")),
            events: vec![event("e1")],
        })),
    );
    let generation = events_generation(&effects);

    reduce(
        &mut state,
        Action::EventsFetched {
            generation,
            result: Ok(vec![event("e1")]),
        },
    );

    assert!(state.is_ready());
    assert!(state.current_event.is_none());
    assert_eq!(state.current_page, Page::dashboard());
}

#[test]
fn stale_rehydration_without_user_drops_selection() {
    let mut state = SessionState::default();
    let effects = reduce(
        &mut state,
        Action::Rehydrated(Some(PersistedSession {
            user: None,
            current_page: Page::new("event-details"),
            current_event: Some(event("e1")),
            events: vec![],
        })),
    );
    assert!(state.is_ready());
    assert!(state.current_event.is_none());
    assert_eq!(state.current_page, Page::auth());
    assert!(!effects
        .iter()
        .any(|e| matches!(e, Effect::FetchEvents { .. })));
}

#[test]
fn failed_heal_stays_healing_until_retry() {
    let mut state = SessionState::default();
    let effects = reduce(
        &mut state,
        Action::Rehydrated(Some(PersistedSession {
            user: Some(user("u1")),
            current_page: Page::dashboard(),
            current_event: Some(event("e1")),
            events: vec![],
        })),
    );
    let generation = events_generation(&effects);

    reduce(
        &mut state,
        Action::EventsFetched {
            generation,
            result: Err("network down".into()),
        },
    );
    assert_eq!(state.phase, HydrationPhase::Healing);
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("network down"));

    let retry = reduce(&mut state, Action::RefreshEvents);
    let generation = events_generation(&retry);
    reduce(
        &mut state,
        Action::EventsFetched {
            generation,
            result: Ok(vec![event("e1")]),
        },
    );
    assert!(state.is_ready());
    assert!(state.error.is_none());
}

#[test]
fn ready_state_never_renders_inconsistent_current_event() {
    let mut state = ready_state();
    reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));
    let actions = vec![
        Action::RemoveEvent("e1".into()),
        Action::SetEvents(vec![event("e3")]),
        Action::AddEvent(event("e1")),
        Action::SetCurrentEvent(Some(event("e9"))),
        Action::RefreshEvents,
    ];
    for action in actions {
        reduce(&mut state, action);
        if state.is_ready() {
            assert!(state.is_consistent(), "inconsistent while ready: {:?}", state);
        }
    }
}

#[test]
fn removing_current_event_moves_back_to_healing() {
    let mut state = ready_state();
    reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));

    let effects = reduce(&mut state, Action::RemoveEvent("e1".into()));

    assert_eq!(state.phase, HydrationPhase::Healing);
    assert!(state.renderable_current_event().is_none());
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::FetchEvents { host_id, .. } if host_id == "u1")));
}

#[test]
fn guest_fetch_runs_once_per_event() {
    let mut state = ready_state();
    let effects = reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));
    let ticket = fetch_ticket(&effects);
    assert_eq!(state.fetching_event_id(), Some("e1"));

    // Re-selecting while in flight does not start a second fetch
    let again = reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));
    assert!(!again.iter().any(|e| matches!(e, Effect::FetchGuests(_))));

    reduce(
        &mut state,
        Action::GuestsFetched {
            ticket,
            result: Ok(vec![guest("g1", "e1"), guest("g2", "e1")]),
        },
    );
    assert!(state.loaded_event_ids.contains("e1"));
    assert!(state.fetching.is_none());
    assert!(!state.is_loading);

    // Already loaded
    let loaded = reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));
    assert!(!loaded.iter().any(|e| matches!(e, Effect::FetchGuests(_))));
    assert_eq!(state.guests_for_event("e1").len(), 2);
}

#[test]
fn superseded_guest_fetch_is_discarded() {
    let mut state = ready_state();
    let ticket_a = fetch_ticket(&reduce(&mut state, Action::SetCurrentEvent(Some(event("e1")))));
    let ticket_b = fetch_ticket(&reduce(&mut state, Action::SetCurrentEvent(Some(event("e2")))));
    assert_ne!(ticket_a, ticket_b);

    reduce(
        &mut state,
        Action::GuestsFetched {
            ticket: ticket_b,
            result: Ok(vec![guest("gb", "e2")]),
        },
    );
    reduce(
        &mut state,
        Action::GuestsFetched {
            ticket: ticket_a,
            result: Ok(vec![guest("ga", "e1")]),
        },
    );

    let ids: Vec<_> = state.guests.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(ids, vec!["gb"]);
    assert!(!state.loaded_event_ids.contains("e1"));
}

#[test]
fn guest_fetch_failure_keeps_prior_guests() {
    let mut state = ready_state();
    reduce(&mut state, Action::SetGuests(vec![guest("g0", "e1")]));
    let ticket = fetch_ticket(&reduce(&mut state, Action::SetCurrentEvent(Some(event("e1")))));

    reduce(
        &mut state,
        Action::GuestsFetched {
            ticket,
            result: Err("timeout".into()),
        },
    );

    assert_eq!(state.guests.len(), 1);
    assert!(!state.is_loading);
    assert_eq!(state.error.as_deref(), Some("timeout"));
    assert!(!state.loaded_event_ids.contains("e1"));
}

#[test]
fn stale_events_refresh_is_discarded() {
    let mut state = ready_state();
    let first = events_generation(&reduce(&mut state, Action::RefreshEvents));
    let second = events_generation(&reduce(&mut state, Action::RefreshEvents));

    reduce(
        &mut state,
        Action::EventsFetched {
            generation: second,
            result: Ok(vec![event("new")]),
        },
    );
    reduce(
        &mut state,
        Action::EventsFetched {
            generation: first,
            result: Ok(vec![event("old")]),
        },
    );

    let ids: Vec<_> = state.events.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["new"]);
}

#[test]
fn logout_cascade_clears_everything_and_signs_out() {
    let mut state = ready_state();
    let ticket = fetch_ticket(&reduce(&mut state, Action::SetCurrentEvent(Some(event("e1")))));
    reduce(
        &mut state,
        Action::GuestsFetched {
            ticket,
            result: Ok(vec![guest("g1", "e1")]),
        },
    );

    let effects = reduce(&mut state, Action::Logout);

    assert!(state.user.is_none());
    assert!(state.current_event.is_none());
    assert!(state.events.is_empty());
    assert!(state.guests.is_empty());
    assert!(state.loaded_event_ids.is_empty());
    assert_eq!(state.current_page, Page::auth());
    assert!(state.is_ready());
    // Persist comes before the remote call
    assert!(matches!(effects.first(), Some(Effect::Persist(p)) if p.user.is_none()));
    assert_eq!(effects.last(), Some(&Effect::SignOut));
}

#[test]
fn set_user_none_is_logout() {
    let mut state = ready_state();
    let effects = reduce(&mut state, Action::SetUser(None));
    assert!(state.events.is_empty());
    assert!(effects.contains(&Effect::SignOut));
}

#[test]
fn signed_out_notification_clears_without_remote_call() {
    let mut state = ready_state();
    let effects = reduce(&mut state, Action::SignedOut);
    assert!(state.user.is_none());
    assert!(!effects.contains(&Effect::SignOut));
}

#[test]
fn signed_in_replaces_user_and_refreshes_events() {
    let mut state = ready_state();
    reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));

    let effects = reduce(&mut state, Action::SignedIn(user("u2")));

    assert_eq!(state.user.as_ref().map(|u| u.id.as_str()), Some("u2"));
    assert!(state.events.is_empty());
    assert!(state.current_event.is_none());
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::FetchEvents { host_id, .. } if host_id == "u2")));
}

#[test]
fn persist_effect_only_when_subset_changes() {
    let mut state = ready_state();
    let effects = reduce(&mut state, Action::SetGuests(vec![guest("g1", "e1")]));
    assert!(!effects.iter().any(|e| matches!(e, Effect::Persist(_))));

    let effects = reduce(&mut state, Action::SetCurrentPage(Page::new("settings")));
    assert!(matches!(
        effects.as_slice(),
        [Effect::Persist(p)] if p.current_page.as_str() == "settings"
    ));
}

#[test]
fn patches_update_collections_and_current_copy() {
    let mut state = ready_state();
    reduce(&mut state, Action::SetCurrentEvent(Some(event("e1"))));
    reduce(&mut state, Action::AddGuest(guest("g1", "e1")));

    reduce(
        &mut state,
        Action::UpdateEvent {
            id: "e1".into(),
            patch: EventPatch {
                location: Some("Rooftop".into()),
                ..Default::default()
            },
        },
    );
    reduce(
        &mut state,
        Action::UpdateGuest {
            id: "g1".into(),
            patch: GuestPatch {
                status: Some(GuestStatus::Confirmed),
                is_checked_in: Some(true),
                ..Default::default()
            },
        },
    );

    assert_eq!(
        state.current_event.as_ref().and_then(|e| e.location.as_deref()),
        Some("Rooftop")
    );
    let g = &state.guests[0];
    assert_eq!(g.status, GuestStatus::Confirmed);
    assert!(g.is_checked_in);

    reduce(&mut state, Action::RemoveGuest("g1".into()));
    assert!(state.guests.is_empty());
}

#[test]
fn removing_event_drops_its_guests_and_loaded_marker() {
    let mut state = ready_state();
    let ticket = fetch_ticket(&reduce(&mut state, Action::SetCurrentEvent(Some(event("e2")))));
    reduce(
        &mut state,
        Action::GuestsFetched {
            ticket,
            result: Ok(vec![guest("g1", "e2")]),
        },
    );
    reduce(&mut state, Action::SetCurrentEvent(None));

    reduce(&mut state, Action::RemoveEvent("e2".into()));

    assert!(state.guests.is_empty());
    assert!(!state.loaded_event_ids.contains("e2"));
    assert!(state.is_ready());
}

#[test]
fn change_feed_inserts_updates_and_deletes() {
    let mut state = ready_state();

    let insert = ChangeNotification::decode(&json!({
        "table": "guests",
        "eventType": "INSERT",
        "new": {"id": "g7", "event_id": "e1", "name": "Kim", "email": "kim@example.com"}
    }))
    .unwrap();
    reduce(&mut state, Action::Change(insert));
    assert_eq!(state.guests_for_event("e1").len(), 1);

    let update = ChangeNotification::decode(&json!({
        "table": "events",
        "eventType": "UPDATE",
        "new": {"id": "e2", "name": "Moved", "event_date": "2027-01-01T00:00:00Z", "host_id": "u1"}
    }))
    .unwrap();
    reduce(&mut state, Action::Change(update));
    assert_eq!(state.events[1].name, "Moved");

    let delete = ChangeNotification::decode(&json!({
        "table": "guests",
        "eventType": "DELETE",
        "old": {"id": "g7"}
    }))
    .unwrap();
    reduce(&mut state, Action::Change(delete));
    assert!(state.guests.is_empty());

    let untracked = ChangeNotification::decode(&json!({
        "table": "email_logs",
        "eventType": "INSERT",
        "new": {"id": "l1"}
    }))
    .unwrap();
    let before = state.clone();
    reduce(&mut state, Action::Change(untracked));
    assert_eq!(state, before);
}
