//! Durable records for PartyHaus: events, guests, email logs and the
//! append-only email event audit trail.
//!
//! # Architecture
//!
//! `AsyncDatabase` owns one dedicated SQLite thread. Queries are sent through
//! a channel and executed in FIFO order:
//!
//! ```ignore
//! let db = AsyncDatabase::open(&paths.database_file()).await?;
//! let log = db.call(move |conn| queries::get_email_log_by_resend_id(conn, &id)).await?;
//! ```
//!
//! Only SQL belongs inside `db.call()`. HTTP calls and JSON shaping happen
//! outside.

mod error;
mod executor;
mod migrations;
mod models;
pub mod queries;

pub use error::{DatabaseError, DatabaseResult};
pub use executor::AsyncDatabase;
pub use migrations::{run_migrations, CURRENT_VERSION};
pub use models::*;
