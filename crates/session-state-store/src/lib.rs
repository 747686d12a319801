//! Client-side session state for PartyHaus.
//!
//! One authoritative cache of `{user, current_page, current_event, events,
//! guests, loaded_event_ids, fetching, is_loading}`:
//!
//! - [`reduce`] is the pure transition function from [`Action`] to state
//!   plus [`Effect`]s
//! - [`SessionStore`] runs those effects against a [`SessionBackend`] and
//!   [`ClientStorage`](partyhaus_storage::ClientStorage), feeding results back
//!   in as actions
//! - [`HydrationPhase`] gates rendering: a stale persisted current event is
//!   suppressed until a fresh events list arrives
//!
//! At most one guest fetch is authoritative at a time. Each fetch carries a
//! [`FetchTicket`]; a result whose ticket no longer matches the slot is
//! discarded on arrival.

mod action;
mod backend;
mod error;
mod hydration;
mod reducer;
mod state;
mod store;

#[cfg(test)]
mod tests;

pub use action::{Action, Effect};
pub use backend::{SessionBackend, SupabaseSessionBackend};
pub use error::{StoreError, StoreResult};
pub use hydration::{HydrationInput, HydrationMachine, HydrationMachineState, HydrationPhase};
pub use reducer::reduce;
pub use state::{FetchTicket, Page, PersistedSession, SessionState};
pub use store::SessionStore;
