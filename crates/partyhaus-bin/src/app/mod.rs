//! Server-side commands and shared wiring.

mod context;
mod invite;
mod migrate;
mod server;

pub use context::{auth_client, client_storage, open_delivery_store, session_store};
pub use invite::send_invitation;
pub use migrate::run_migrations;
pub use server::run_server;
