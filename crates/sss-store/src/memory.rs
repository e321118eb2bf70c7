//! In-memory storage backend.
//!
//! Keeps events, operations, and webhook registrations in RAM.
//! Useful for testing and short-lived indexers that don't need persistence.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Mutex;
use uuid::Uuid;

use crate::{AuditStore, EventRecord, StoredOperation, WebhookStore};
use sss_core::{DecodedEvent, OperationRecord, StoreError, WebhookRegistration};

#[derive(Default)]
struct AuditTables {
    events: Vec<EventRecord>,
    event_signatures: HashSet<String>,
    operations: Vec<StoredOperation>,
    operation_signatures: HashSet<String>,
}

/// In-memory audit + webhook store.
///
/// All data is lost when the process exits.
#[derive(Default)]
pub struct MemoryStore {
    audit: Mutex<AuditTables>,
    webhooks: Mutex<Vec<WebhookRegistration>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored events.
    pub fn event_count(&self) -> usize {
        self.audit.lock().unwrap().events.len()
    }

    /// Total number of stored operations.
    pub fn operation_count(&self) -> usize {
        self.audit.lock().unwrap().operations.len()
    }
}

fn page<T: Clone>(
    rows: &[T],
    keep: impl Fn(&T) -> bool,
    key: impl Fn(&T) -> (u64, i64),
    limit: usize,
    offset: usize,
) -> Vec<T> {
    let mut out: Vec<T> = rows.iter().filter(|r| keep(r)).cloned().collect();
    out.sort_by_key(|r| std::cmp::Reverse(key(r)));
    out.into_iter().skip(offset).take(limit).collect()
}

#[async_trait]
impl AuditStore for MemoryStore {
    async fn record_event(&self, event: &DecodedEvent) -> Result<bool, StoreError> {
        let mut audit = self.audit.lock().unwrap();
        if !audit.event_signatures.insert(event.signature.clone()) {
            return Ok(false);
        }
        let id = audit.events.len() as i64 + 1;
        audit.events.push(EventRecord::from_event(id, event));
        Ok(true)
    }

    async fn record_operation(&self, op: &OperationRecord) -> Result<bool, StoreError> {
        let mut audit = self.audit.lock().unwrap();
        if !audit.operation_signatures.insert(op.signature.clone()) {
            return Ok(false);
        }
        let id = audit.operations.len() as i64 + 1;
        audit.operations.push(StoredOperation {
            id,
            record: op.clone(),
            recorded_at: Utc::now(),
        });
        Ok(true)
    }

    async fn list_events(
        &self,
        subject: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let audit = self.audit.lock().unwrap();
        Ok(page(
            &audit.events,
            |e| subject.map_or(true, |s| e.subject == s),
            |e| (e.slot, e.id),
            limit,
            offset,
        ))
    }

    async fn list_operations(
        &self,
        subject: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredOperation>, StoreError> {
        let audit = self.audit.lock().unwrap();
        // Operations carry no slot; insertion order is chain order here.
        Ok(page(
            &audit.operations,
            |o| subject.map_or(true, |s| o.record.subject == s),
            |o| (0, o.id),
            limit,
            offset,
        ))
    }
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn insert_webhook(&self, hook: &WebhookRegistration) -> Result<(), StoreError> {
        self.webhooks.lock().unwrap().push(hook.clone());
        Ok(())
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>, StoreError> {
        Ok(self.webhooks.lock().unwrap().clone())
    }

    async fn remove_webhook(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut hooks = self.webhooks.lock().unwrap();
        let before = hooks.len();
        hooks.retain(|h| h.id != id);
        Ok(hooks.len() != before)
    }

    async fn set_webhook_active(&self, id: Uuid, active: bool) -> Result<bool, StoreError> {
        let mut hooks = self.webhooks.lock().unwrap();
        match hooks.iter_mut().find(|h| h.id == id) {
            Some(hook) => {
                hook.active = active;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sss_core::{project, EventKind, FieldValue, Fields, Pubkey};

    fn event(sig: &str, subject_byte: u8, slot: u64) -> DecodedEvent {
        let subject = Pubkey::new_from_array([subject_byte; 32]);
        let mut fields = Fields::new();
        fields.insert("stablecoin".into(), FieldValue::Pubkey(subject));
        fields.insert("paused_by".into(), FieldValue::Pubkey(Pubkey::new_from_array([9; 32])));
        fields.insert("timestamp".into(), FieldValue::I64(slot as i64));
        DecodedEvent {
            kind: EventKind::StablecoinPaused,
            fields,
            subject: subject.to_string(),
            signature: sig.into(),
            slot,
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn duplicate_signature_is_ignored() {
        let store = MemoryStore::new();
        let ev = event("sig", 1, 10);
        assert!(store.record_event(&ev).await.unwrap());
        assert!(!store.record_event(&ev).await.unwrap());
        assert_eq!(store.list_events(None, 100, 0).await.unwrap().len(), 1);

        let op = project(ev.kind, &ev.fields, &ev.signature);
        assert!(store.record_operation(&op).await.unwrap());
        assert!(!store.record_operation(&op).await.unwrap());
        assert_eq!(store.operation_count(), 1);
    }

    #[tokio::test]
    async fn most_recent_first_with_pagination() {
        let store = MemoryStore::new();
        for (i, slot) in [5u64, 30, 20].into_iter().enumerate() {
            store.record_event(&event(&format!("s{i}"), 1, slot)).await.unwrap();
        }
        store.record_event(&event("other", 2, 99)).await.unwrap();

        let subject = Pubkey::new_from_array([1; 32]).to_string();
        let all = store.list_events(Some(&subject), 10, 0).await.unwrap();
        let slots: Vec<u64> = all.iter().map(|e| e.slot).collect();
        assert_eq!(slots, vec![30, 20, 5]);

        let second_page = store.list_events(Some(&subject), 2, 2).await.unwrap();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].slot, 5);

        assert_eq!(store.list_events(None, 1, 0).await.unwrap()[0].signature, "other");
    }

    #[tokio::test]
    async fn webhook_crud() {
        let store = MemoryStore::new();
        let hook = WebhookRegistration::new("https://example.com/hook", vec!["*".into()], None);
        store.insert_webhook(&hook).await.unwrap();

        assert!(store.set_webhook_active(hook.id, false).await.unwrap());
        assert!(!store.list_webhooks().await.unwrap()[0].active);

        assert!(store.remove_webhook(hook.id).await.unwrap());
        assert!(!store.remove_webhook(hook.id).await.unwrap());
        assert!(!store.set_webhook_active(hook.id, true).await.unwrap());
        assert!(store.list_webhooks().await.unwrap().is_empty());
    }
}
