//! Authentication commands.
//!
//! Each command restores the persisted session store first, so the local
//! cache and the auth session stay in step.

mod login;
mod logout;
mod session;

pub use login::login;
pub use logout::logout;
pub use session::show_session;

use session_state_store::SessionStore;

/// Print the renderable part of the session state.
fn print_state(store: &SessionStore) {
    match store.user() {
        Some(user) => println!("Signed in as {} ({})", user.email, user.id),
        None => println!("Not signed in"),
    }
    println!("  Page:   {}", store.current_page());
    println!("  Phase:  {:?}", store.phase());
    println!("  Events: {}", store.events().len());
    if let Some(event) = store.renderable_current_event() {
        println!(
            "  Current event: {} ({} guests loaded)",
            event.name,
            store.guests_for_event(&event.id).len()
        );
    }
    if let Some(error) = store.error() {
        println!("  Last error: {}", error);
    }
}
