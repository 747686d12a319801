//! Realtime change notifications.
//!
//! The websocket transport belongs to the hosted service; this module takes
//! the postgres-changes payloads it delivers, decodes them into
//! [`ChangeNotification`]s and fans them out to in-process subscribers.
//! Both the client-library shape (`eventType`/`new`/`old`) and the raw wire
//! shape (`data.type`/`data.record`/`data.old_record`) are accepted.

use crate::{SupabaseError, SupabaseResult};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeEventType {
    Insert,
    Update,
    Delete,
}

impl ChangeEventType {
    fn parse(raw: &str) -> Option<Self> {
        match raw.to_ascii_uppercase().as_str() {
            "INSERT" => Some(Self::Insert),
            "UPDATE" => Some(Self::Update),
            "DELETE" => Some(Self::Delete),
            _ => None,
        }
    }
}

/// One row change on a subscribed table.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeNotification {
    pub table: String,
    pub event_type: ChangeEventType,
    /// Row after the change (absent for deletes).
    pub new: Option<Value>,
    /// Row before the change; for deletes usually only the primary key.
    pub old: Option<Value>,
}

fn non_empty_record(value: Option<&Value>) -> Option<Value> {
    match value {
        Some(Value::Object(map)) if !map.is_empty() => Some(Value::Object(map.clone())),
        _ => None,
    }
}

impl ChangeNotification {
    pub fn decode(payload: &Value) -> SupabaseResult<Self> {
        // Wire shape nests everything under `data`, sometimes under `payload`.
        let body = payload.get("payload").unwrap_or(payload);
        let body = body.get("data").unwrap_or(body);

        let raw_type = body
            .get("eventType")
            .or_else(|| body.get("type"))
            .and_then(Value::as_str)
            .ok_or_else(|| SupabaseError::Decode("change payload has no event type".into()))?;
        let event_type = ChangeEventType::parse(raw_type).ok_or_else(|| {
            SupabaseError::Decode(format!("unknown change event type: {}", raw_type))
        })?;

        let table = body
            .get("table")
            .and_then(Value::as_str)
            .ok_or_else(|| SupabaseError::Decode("change payload has no table".into()))?
            .to_string();

        Ok(Self {
            table,
            event_type,
            new: non_empty_record(body.get("new").or_else(|| body.get("record"))),
            old: non_empty_record(body.get("old").or_else(|| body.get("old_record"))),
        })
    }

    /// Deserialize the new row.
    pub fn new_record<T: DeserializeOwned>(&self) -> SupabaseResult<Option<T>> {
        self.new
            .clone()
            .map(serde_json::from_value)
            .transpose()
            .map_err(SupabaseError::from)
    }

    /// `id` of the changed row, from the new row or else the old one.
    pub fn record_id(&self) -> Option<&str> {
        self.new
            .as_ref()
            .and_then(|r| r.get("id"))
            .or_else(|| self.old.as_ref().and_then(|r| r.get("id")))
            .and_then(Value::as_str)
    }
}

/// Table (and optional `column=eq.value` filter) a subscriber listens to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub table: String,
    pub filter: Option<(String, String)>,
}

impl Subscription {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filter: None,
        }
    }

    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filter = Some((column.into(), value.into()));
        self
    }

    pub fn matches(&self, change: &ChangeNotification) -> bool {
        if change.table != self.table {
            return false;
        }
        let Some((column, expected)) = &self.filter else {
            return true;
        };
        [change.new.as_ref(), change.old.as_ref()]
            .into_iter()
            .flatten()
            .filter_map(|record| record.get(column))
            .any(|value| match value {
                Value::String(s) => s == expected,
                other => other.to_string() == *expected,
            })
    }
}

/// In-process fan-out of decoded change notifications.
#[derive(Default)]
pub struct ChangeFeed {
    subscribers: Mutex<Vec<(Subscription, mpsc::UnboundedSender<ChangeNotification>)>>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn subscribe(
        &self,
        subscription: Subscription,
    ) -> mpsc::UnboundedReceiver<ChangeNotification> {
        let (tx, rx) = mpsc::unbounded_channel();
        debug!(table = %subscription.table, "Realtime subscription added");
        self.subscribers.lock().await.push((subscription, tx));
        rx
    }

    /// Decode one payload and deliver it to every matching subscriber.
    /// Returns the number of deliveries; closed subscribers are dropped.
    pub async fn dispatch(&self, payload: &Value) -> SupabaseResult<usize> {
        let change = ChangeNotification::decode(payload)?;
        let mut subscribers = self.subscribers.lock().await;
        subscribers.retain(|(_, tx)| !tx.is_closed());

        let mut delivered = 0;
        for (subscription, tx) in subscribers.iter() {
            if subscription.matches(&change) && tx.send(change.clone()).is_ok() {
                delivered += 1;
            }
        }
        trace!(table = %change.table, delivered, "Change dispatched");
        Ok(delivered)
    }
}
