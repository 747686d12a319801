//! Standalone query functions.
//!
//! Each function takes a `&Connection` as its first parameter so it can run
//! inside `AsyncDatabase::call` or against a plain connection in tests.

use crate::{
    DatabaseError, DatabaseResult, EmailEvent, EmailLog, EmailLogUpdate, EmailStatus, Event, Guest,
    GuestStatus, NewEmailEvent, NewEmailLog, NewEvent, NewGuest,
};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

// ==========================================
// Events
// ==========================================

const EVENT_COLUMNS: &str =
    "id, name, description, location, event_date, host_id, is_public, max_guests";

fn event_from_row(row: &Row<'_>) -> rusqlite::Result<Event> {
    Ok(Event {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        location: row.get(3)?,
        event_date: row.get(4)?,
        host_id: row.get(5)?,
        is_public: row.get(6)?,
        max_guests: row.get(7)?,
    })
}

/// Insert a new event.
pub fn insert_event(conn: &Connection, event: &NewEvent) -> DatabaseResult<Event> {
    conn.execute(
        "INSERT INTO events (id, name, description, location, event_date, host_id, is_public, max_guests)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            event.id,
            event.name,
            event.description,
            event.location,
            event.event_date,
            event.host_id,
            event.is_public,
            event.max_guests,
        ],
    )?;
    get_event(conn, &event.id)?
        .ok_or_else(|| DatabaseError::NotFound("Event not found after insert".to_string()))
}

/// Get an event by ID.
pub fn get_event(conn: &Connection, id: &str) -> DatabaseResult<Option<Event>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE id = ?1"
    ))?;
    Ok(stmt.query_row(params![id], event_from_row).optional()?)
}

/// List a host's events, soonest first.
pub fn list_events_for_host(conn: &Connection, host_id: &str) -> DatabaseResult<Vec<Event>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {EVENT_COLUMNS} FROM events WHERE host_id = ?1 ORDER BY event_date ASC"
    ))?;
    let events = stmt
        .query_map(params![host_id], event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

/// Delete an event (its guests cascade).
pub fn delete_event(conn: &Connection, id: &str) -> DatabaseResult<bool> {
    let count = conn.execute("DELETE FROM events WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

// ==========================================
// Guests
// ==========================================

const GUEST_COLUMNS: &str =
    "id, event_id, user_id, name, email, status, is_checked_in, email_status, current_email_log_id";

fn guest_from_row(row: &Row<'_>) -> rusqlite::Result<Guest> {
    let email_status: Option<String> = row.get(7)?;
    Ok(Guest {
        id: row.get(0)?,
        event_id: row.get(1)?,
        user_id: row.get(2)?,
        name: row.get(3)?,
        email: row.get(4)?,
        status: GuestStatus::from_str(&row.get::<_, String>(5)?),
        is_checked_in: row.get(6)?,
        email_status: email_status.as_deref().and_then(EmailStatus::from_str),
        current_email_log_id: row.get(8)?,
    })
}

/// Insert a new guest.
pub fn insert_guest(conn: &Connection, guest: &NewGuest) -> DatabaseResult<Guest> {
    conn.execute(
        "INSERT INTO guests (id, event_id, user_id, name, email, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            guest.id,
            guest.event_id,
            guest.user_id,
            guest.name,
            guest.email,
            guest.status.as_str(),
        ],
    )?;
    get_guest(conn, &guest.id)?
        .ok_or_else(|| DatabaseError::NotFound("Guest not found after insert".to_string()))
}

/// Get a guest by ID.
pub fn get_guest(conn: &Connection, id: &str) -> DatabaseResult<Option<Guest>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {GUEST_COLUMNS} FROM guests WHERE id = ?1"
    ))?;
    Ok(stmt.query_row(params![id], guest_from_row).optional()?)
}

/// List the guests of one event.
pub fn list_guests_for_event(conn: &Connection, event_id: &str) -> DatabaseResult<Vec<Guest>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {GUEST_COLUMNS} FROM guests WHERE event_id = ?1 ORDER BY name ASC"
    ))?;
    let guests = stmt
        .query_map(params![event_id], guest_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(guests)
}

/// Point a guest at a freshly dispatched email log.
pub fn set_guest_current_email(
    conn: &Connection,
    guest_id: &str,
    email_log_id: &str,
    status: EmailStatus,
) -> DatabaseResult<bool> {
    let count = conn.execute(
        "UPDATE guests SET current_email_log_id = ?1, email_status = ?2 WHERE id = ?3",
        params![email_log_id, status.as_str(), guest_id],
    )?;
    Ok(count > 0)
}

/// Update a guest's denormalized email status, but only while the guest
/// still points at `email_log_id`. Returns false when the pointer moved on
/// (or the guest is gone).
pub fn update_guest_email_status_if_current(
    conn: &Connection,
    guest_id: &str,
    email_log_id: &str,
    status: EmailStatus,
) -> DatabaseResult<bool> {
    let count = conn.execute(
        "UPDATE guests SET email_status = ?1 WHERE id = ?2 AND current_email_log_id = ?3",
        params![status.as_str(), guest_id, email_log_id],
    )?;
    debug!(guest_id, email_log_id, updated = count > 0, "Guest email status update");
    Ok(count > 0)
}

// ==========================================
// Email logs
// ==========================================

const EMAIL_LOG_COLUMNS: &str = "id, resend_email_id, guest_id, status, sent_at, delivered_at, opened_at, clicked_at, bounced_at, error_message, webhook_data";

fn email_log_from_row(row: &Row<'_>) -> rusqlite::Result<EmailLog> {
    Ok(EmailLog {
        id: row.get(0)?,
        resend_email_id: row.get(1)?,
        guest_id: row.get(2)?,
        status: email_status_column(row, 3)?,
        sent_at: parse_optional_datetime(row.get(4)?),
        delivered_at: parse_optional_datetime(row.get(5)?),
        opened_at: parse_optional_datetime(row.get(6)?),
        clicked_at: parse_optional_datetime(row.get(7)?),
        bounced_at: parse_optional_datetime(row.get(8)?),
        error_message: row.get(9)?,
        webhook_data: row
            .get::<_, Option<String>>(10)?
            .and_then(|raw| serde_json::from_str(&raw).ok()),
    })
}

/// Insert a new email log.
pub fn insert_email_log(conn: &Connection, log: &NewEmailLog) -> DatabaseResult<EmailLog> {
    conn.execute(
        "INSERT INTO email_logs (id, resend_email_id, guest_id, status, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            log.id,
            log.resend_email_id,
            log.guest_id,
            log.status.as_str(),
            log.sent_at.map(|t| t.to_rfc3339()),
        ],
    )?;
    get_email_log(conn, &log.id)?
        .ok_or_else(|| DatabaseError::NotFound("Email log not found after insert".to_string()))
}

/// Get an email log by ID.
pub fn get_email_log(conn: &Connection, id: &str) -> DatabaseResult<Option<EmailLog>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {EMAIL_LOG_COLUMNS} FROM email_logs WHERE id = ?1"
    ))?;
    Ok(stmt.query_row(params![id], email_log_from_row).optional()?)
}

/// Get an email log by the provider-assigned email id.
pub fn get_email_log_by_resend_id(
    conn: &Connection,
    resend_email_id: &str,
) -> DatabaseResult<Option<EmailLog>> {
    let mut stmt = conn.prepare_cached(&format!(
        "SELECT {EMAIL_LOG_COLUMNS} FROM email_logs WHERE resend_email_id = ?1"
    ))?;
    Ok(stmt
        .query_row(params![resend_email_id], email_log_from_row)
        .optional()?)
}

/// Apply one delivery event's fields to an email log as a single-row update.
pub fn update_email_log(
    conn: &Connection,
    id: &str,
    update: &EmailLogUpdate,
) -> DatabaseResult<bool> {
    let webhook_data = serde_json::to_string(&update.webhook_data)?;
    let count = conn.execute(
        "UPDATE email_logs SET
            status = COALESCE(?1, status),
            sent_at = COALESCE(?2, sent_at),
            delivered_at = COALESCE(?3, delivered_at),
            opened_at = COALESCE(?4, opened_at),
            clicked_at = COALESCE(?5, clicked_at),
            bounced_at = COALESCE(?6, bounced_at),
            error_message = COALESCE(?7, error_message),
            webhook_data = ?8,
            updated_at = ?9
         WHERE id = ?10",
        params![
            update.status.map(|s| s.as_str()),
            update.sent_at.map(|t| t.to_rfc3339()),
            update.delivered_at.map(|t| t.to_rfc3339()),
            update.opened_at.map(|t| t.to_rfc3339()),
            update.clicked_at.map(|t| t.to_rfc3339()),
            update.bounced_at.map(|t| t.to_rfc3339()),
            update.error_message,
            webhook_data,
            Utc::now().to_rfc3339(),
            id,
        ],
    )?;
    Ok(count > 0)
}

// ==========================================
// Email events
// ==========================================

fn email_event_from_row(row: &Row<'_>) -> rusqlite::Result<EmailEvent> {
    let raw: String = row.get(5)?;
    Ok(EmailEvent {
        id: row.get(0)?,
        email_log_id: row.get(1)?,
        resend_email_id: row.get(2)?,
        event_type: row.get(3)?,
        timestamp: parse_datetime(row.get::<_, String>(4)?),
        webhook_data: serde_json::from_str(&raw).unwrap_or(serde_json::Value::Null),
    })
}

/// Append an email event audit row.
pub fn insert_email_event(conn: &Connection, event: &NewEmailEvent) -> DatabaseResult<EmailEvent> {
    conn.execute(
        "INSERT INTO email_events (id, email_log_id, resend_email_id, event_type, timestamp, webhook_data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            event.id,
            event.email_log_id,
            event.resend_email_id,
            event.event_type,
            event.timestamp.to_rfc3339(),
            serde_json::to_string(&event.webhook_data)?,
        ],
    )?;
    Ok(EmailEvent {
        id: event.id.clone(),
        email_log_id: event.email_log_id.clone(),
        resend_email_id: event.resend_email_id.clone(),
        event_type: event.event_type.clone(),
        timestamp: event.timestamp,
        webhook_data: event.webhook_data.clone(),
    })
}

/// List the audit rows for one email log in arrival order.
pub fn list_email_events_for_log(
    conn: &Connection,
    email_log_id: &str,
) -> DatabaseResult<Vec<EmailEvent>> {
    let mut stmt = conn.prepare_cached(
        "SELECT id, email_log_id, resend_email_id, event_type, timestamp, webhook_data
         FROM email_events WHERE email_log_id = ?1 ORDER BY rowid ASC",
    )?;
    let events = stmt
        .query_map(params![email_log_id], email_event_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(events)
}

// ==========================================
// Helpers
// ==========================================

fn email_status_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<EmailStatus> {
    let raw: String = row.get(idx)?;
    EmailStatus::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            rusqlite::types::Type::Text,
            Box::new(DatabaseError::InvalidData(format!(
                "unknown email status: {raw}"
            ))),
        )
    })
}

fn parse_datetime(s: String) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| {
        DateTime::parse_from_rfc3339(&s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_migrations;
    use chrono::TimeZone;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn seed_event_and_guest(conn: &Connection) -> Guest {
        insert_event(
            conn,
            &NewEvent {
                id: "e1".into(),
                name: "Housewarming".into(),
                description: Some("Bring snacks".into()),
                location: None,
                event_date: "2026-11-07T19:00:00Z".into(),
                host_id: "u1".into(),
                is_public: false,
                max_guests: Some(20),
            },
        )
        .unwrap();
        insert_guest(
            conn,
            &NewGuest {
                id: "g1".into(),
                event_id: "e1".into(),
                user_id: None,
                name: "Ada".into(),
                email: "ada@example.com".into(),
                status: GuestStatus::Pending,
            },
        )
        .unwrap()
    }

    fn seed_log(conn: &Connection, id: &str, resend_id: &str) -> EmailLog {
        insert_email_log(
            conn,
            &NewEmailLog {
                id: id.into(),
                resend_email_id: resend_id.into(),
                guest_id: Some("g1".into()),
                status: EmailStatus::Sent,
                sent_at: Some(Utc::now()),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_event_crud() {
        let conn = setup();
        seed_event_and_guest(&conn);

        let event = get_event(&conn, "e1").unwrap().unwrap();
        assert_eq!(event.max_guests, Some(20));
        assert_eq!(list_events_for_host(&conn, "u1").unwrap().len(), 1);
        assert!(list_events_for_host(&conn, "u2").unwrap().is_empty());

        assert!(delete_event(&conn, "e1").unwrap());
        assert!(get_event(&conn, "e1").unwrap().is_none());
        assert!(get_guest(&conn, "g1").unwrap().is_none(), "guests cascade");
    }

    #[test]
    fn test_guest_listing() {
        let conn = setup();
        let guest = seed_event_and_guest(&conn);
        assert_eq!(guest.status, GuestStatus::Pending);
        assert!(guest.email_status.is_none());

        let guests = list_guests_for_event(&conn, "e1").unwrap();
        assert_eq!(guests, vec![guest]);
    }

    #[test]
    fn test_email_log_lookup_by_resend_id() {
        let conn = setup();
        seed_event_and_guest(&conn);
        let log = seed_log(&conn, "l1", "em_1");

        let found = get_email_log_by_resend_id(&conn, "em_1").unwrap().unwrap();
        assert_eq!(found.id, log.id);
        assert_eq!(found.status, EmailStatus::Sent);
        assert!(get_email_log_by_resend_id(&conn, "em_missing").unwrap().is_none());
    }

    #[test]
    fn test_update_email_log_keeps_unset_columns() {
        let conn = setup();
        seed_event_and_guest(&conn);
        let log = seed_log(&conn, "l1", "em_1");
        let delivered_at = Utc.with_ymd_and_hms(2026, 10, 1, 12, 0, 0).unwrap();

        let updated = update_email_log(
            &conn,
            "l1",
            &EmailLogUpdate {
                status: Some(EmailStatus::Delivered),
                delivered_at: Some(delivered_at),
                webhook_data: serde_json::json!({"type": "email.delivered"}),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(updated);

        let stored = get_email_log(&conn, "l1").unwrap().unwrap();
        assert_eq!(stored.status, EmailStatus::Delivered);
        assert_eq!(stored.delivered_at, Some(delivered_at));
        assert_eq!(
            stored.sent_at.map(|t| t.timestamp()),
            log.sent_at.map(|t| t.timestamp())
        );
        assert_eq!(
            stored.webhook_data,
            Some(serde_json::json!({"type": "email.delivered"}))
        );

        assert!(!update_email_log(&conn, "nope", &EmailLogUpdate::default()).unwrap());
    }

    #[test]
    fn test_guest_email_status_guard() {
        let conn = setup();
        seed_event_and_guest(&conn);
        seed_log(&conn, "l1", "em_1");
        seed_log(&conn, "l2", "em_2");

        assert!(set_guest_current_email(&conn, "g1", "l2", EmailStatus::Sent).unwrap());

        // Stale log no longer owns the pointer.
        assert!(!update_guest_email_status_if_current(&conn, "g1", "l1", EmailStatus::Bounced).unwrap());
        let guest = get_guest(&conn, "g1").unwrap().unwrap();
        assert_eq!(guest.email_status, Some(EmailStatus::Sent));

        assert!(update_guest_email_status_if_current(&conn, "g1", "l2", EmailStatus::Delivered).unwrap());
        let guest = get_guest(&conn, "g1").unwrap().unwrap();
        assert_eq!(guest.email_status, Some(EmailStatus::Delivered));
        assert_eq!(guest.current_email_log_id.as_deref(), Some("l2"));
    }

    #[test]
    fn test_email_events_append_in_order() {
        let conn = setup();
        seed_event_and_guest(&conn);
        seed_log(&conn, "l1", "em_1");

        for (id, kind) in [("ev1", "email.sent"), ("ev2", "email.delivered"), ("ev3", "email.delivered")] {
            insert_email_event(
                &conn,
                &NewEmailEvent {
                    id: id.into(),
                    email_log_id: "l1".into(),
                    resend_email_id: "em_1".into(),
                    event_type: kind.into(),
                    timestamp: Utc::now(),
                    webhook_data: serde_json::json!({"type": kind}),
                },
            )
            .unwrap();
        }

        let events = list_email_events_for_log(&conn, "l1").unwrap();
        let kinds: Vec<_> = events.iter().map(|e| e.event_type.as_str()).collect();
        assert_eq!(kinds, vec!["email.sent", "email.delivered", "email.delivered"]);
        assert_eq!(events[2].webhook_data["type"], "email.delivered");
    }

    #[test]
    fn test_unknown_status_in_row_is_an_error() {
        let conn = setup();
        conn.execute(
            "INSERT INTO email_logs (id, resend_email_id, status) VALUES ('l9', 'em_9', 'queued')",
            [],
        )
        .unwrap();
        assert!(get_email_log(&conn, "l9").is_err());
    }
}
