//! sss-store — audit trail and webhook registration storage.
//!
//! Backends:
//! - [`memory`] — in-memory (dev/testing, no persistence)
//! - [`sqlite`] — SQLite via `sqlx` (embedded, single-file persistence)
//!
//! Event and operation inserts are idempotent on the transaction
//! signature: a duplicate is reported as `Ok(false)`, never as an error,
//! and never produces a second row.

#[cfg(feature = "memory")]
pub mod memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

#[cfg(feature = "memory")]
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sss_core::{DecodedEvent, OperationRecord, StoreError, WebhookRegistration};
use uuid::Uuid;

/// A persisted event row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: i64,
    pub event_type: String,
    pub subject: String,
    /// Field map as JSON, in wire order
    pub fields: serde_json::Value,
    pub signature: String,
    pub slot: u64,
    pub captured_at: DateTime<Utc>,
}

impl EventRecord {
    /// Build the row for `event`; `id` is assigned by the store.
    pub fn from_event(id: i64, event: &DecodedEvent) -> Self {
        Self {
            id,
            event_type: event.kind.name().to_string(),
            subject: event.subject.clone(),
            fields: event.fields_json(),
            signature: event.signature.clone(),
            slot: event.slot,
            captured_at: event.captured_at,
        }
    }
}

/// A persisted operation projection row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredOperation {
    pub id: i64,
    #[serde(flatten)]
    pub record: OperationRecord,
    pub recorded_at: DateTime<Utc>,
}

/// Append-only event log plus its derived operation view.
#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Insert an event row. `Ok(false)` if its signature is already stored.
    async fn record_event(&self, event: &DecodedEvent) -> Result<bool, StoreError>;

    /// Insert an operation row. `Ok(false)` if its signature is already stored.
    async fn record_operation(&self, op: &OperationRecord) -> Result<bool, StoreError>;

    /// Events, most recent first, optionally restricted to one subject.
    async fn list_events(
        &self,
        subject: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EventRecord>, StoreError>;

    /// Operations, most recent first, optionally restricted to one subject.
    async fn list_operations(
        &self,
        subject: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredOperation>, StoreError>;
}

/// Webhook registration CRUD.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    async fn insert_webhook(&self, hook: &WebhookRegistration) -> Result<(), StoreError>;

    /// All registrations, oldest first.
    async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>, StoreError>;

    /// `Ok(false)` if no registration has that id.
    async fn remove_webhook(&self, id: Uuid) -> Result<bool, StoreError>;

    /// `Ok(false)` if no registration has that id.
    async fn set_webhook_active(&self, id: Uuid, active: bool) -> Result<bool, StoreError>;
}
