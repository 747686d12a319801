//! Shared fixtures for the crate's unit tests.

use crate::SqliteDeliveryStore;
use partyhaus_database::{
    queries, AsyncDatabase, EmailStatus, GuestStatus, NewEmailLog, NewEvent, NewGuest,
};

/// In-memory store with event `e1` (host `u1`) and guest `g1`.
pub async fn seeded_sqlite() -> SqliteDeliveryStore {
    let db = AsyncDatabase::open_in_memory().await.unwrap();
    db.call(|conn| {
        queries::insert_event(
            conn,
            &NewEvent {
                id: "e1".into(),
                name: "Launch <Party>".into(),
                description: Some("Rooftop & snacks".into()),
                location: Some("Pier 7".into()),
                event_date: "2026-11-01T18:00:00Z".into(),
                host_id: "u1".into(),
                is_public: false,
                max_guests: None,
            },
        )?;
        queries::insert_guest(
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
    })
    .await
    .unwrap();
    SqliteDeliveryStore::new(db)
}

/// Seeded store plus log `l1` for provider id `em_1`, current for `g1`.
pub async fn seeded_with_log() -> SqliteDeliveryStore {
    let store = seeded_sqlite().await;
    store
        .database()
        .call(|conn| {
            queries::insert_email_log(
                conn,
                &NewEmailLog {
                    id: "l1".into(),
                    resend_email_id: "em_1".into(),
                    guest_id: Some("g1".into()),
                    status: EmailStatus::Sent,
                    sent_at: None,
                },
            )?;
            queries::set_guest_current_email(conn, "g1", "l1", EmailStatus::Sent)
        })
        .await
        .unwrap();
    store
}
