//! Database migrations.
//!
//! Migrations run in order and are tracked in the `migrations` table.

use crate::DatabaseResult;
use rusqlite::Connection;
use tracing::{debug, info};

/// Current schema version.
pub const CURRENT_VERSION: i32 = 2;

/// Run all pending migrations.
pub fn run_migrations(conn: &Connection) -> DatabaseResult<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
        [],
    )?;

    let current_version: i32 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM migrations",
        [],
        |row| row.get(0),
    )?;

    info!(current_version, target_version = CURRENT_VERSION, "Running migrations");

    if current_version < 1 {
        migrate_v1_events_and_guests(conn)?;
    }
    if current_version < 2 {
        migrate_v2_email_delivery(conn)?;
    }

    info!("Migrations complete");
    Ok(())
}

fn record_migration(conn: &Connection, version: i32, name: &str) -> DatabaseResult<()> {
    conn.execute(
        "INSERT INTO migrations (version, name) VALUES (?1, ?2)",
        rusqlite::params![version, name],
    )?;
    debug!(version, name, "Migration applied");
    Ok(())
}

/// V1: events and guests.
fn migrate_v1_events_and_guests(conn: &Connection) -> DatabaseResult<()> {
    info!("Applying migration v1: events and guests");

    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS events (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            description TEXT,
            location TEXT,
            event_date TEXT NOT NULL,
            host_id TEXT NOT NULL,
            is_public INTEGER NOT NULL DEFAULT 0,
            max_guests INTEGER,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_events_host_id ON events(host_id);

        CREATE TABLE IF NOT EXISTS guests (
            id TEXT PRIMARY KEY,
            event_id TEXT NOT NULL REFERENCES events(id) ON DELETE CASCADE,
            user_id TEXT,
            name TEXT NOT NULL,
            email TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'pending',
            is_checked_in INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_guests_event_id ON guests(event_id);
        ",
    )?;

    record_migration(conn, 1, "events_and_guests")?;
    Ok(())
}

/// V2: email logs, the email event audit trail and the guest's
/// denormalized email status.
fn migrate_v2_email_delivery(conn: &Connection) -> DatabaseResult<()> {
    info!("Applying migration v2: email delivery");

    conn.execute_batch(
        "
        ALTER TABLE guests ADD COLUMN email_status TEXT;
        ALTER TABLE guests ADD COLUMN current_email_log_id TEXT;

        CREATE TABLE IF NOT EXISTS email_logs (
            id TEXT PRIMARY KEY,
            resend_email_id TEXT NOT NULL UNIQUE,
            guest_id TEXT REFERENCES guests(id) ON DELETE SET NULL,
            status TEXT NOT NULL DEFAULT 'sent',
            sent_at TEXT,
            delivered_at TEXT,
            opened_at TEXT,
            clicked_at TEXT,
            bounced_at TEXT,
            error_message TEXT,
            webhook_data TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            updated_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_email_logs_guest_id ON email_logs(guest_id);

        CREATE TABLE IF NOT EXISTS email_events (
            id TEXT PRIMARY KEY,
            email_log_id TEXT NOT NULL REFERENCES email_logs(id) ON DELETE CASCADE,
            resend_email_id TEXT NOT NULL,
            event_type TEXT NOT NULL,
            timestamp TEXT NOT NULL,
            webhook_data TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE INDEX IF NOT EXISTS idx_email_events_email_log_id
            ON email_events(email_log_id);
        ",
    )?;

    record_migration(conn, 2, "email_delivery")?;
    Ok(())
}
