//! SQLite storage backend.
//!
//! Persists events, operation projections, and webhook registrations to a
//! single SQLite file. Uses `sqlx` with WAL mode for concurrent read
//! performance. Inserts use `ON CONFLICT(signature) DO NOTHING`, so
//! concurrent writers retrying the same transaction never collide.
//!
//! # Usage
//! ```rust,no_run
//! use sss_store::sqlite::SqliteStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // File-backed (persistent)
//! let store = SqliteStore::open("./sss-audit.db").await?;
//!
//! // In-memory (tests / ephemeral)
//! let store = SqliteStore::in_memory().await?;
//! # Ok(())
//! # }
//! ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::{AuditStore, EventRecord, StoredOperation, WebhookStore};
use sss_core::{DecodedEvent, OperationRecord, StoreError, WebhookRegistration};

fn db(e: sqlx::Error) -> StoreError {
    StoreError::Database(e.to_string())
}

/// SQLite-backed audit + webhook store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (or create) a SQLite database at `path`.
    ///
    /// The path may be a plain file path (`"./audit.db"`) or a full
    /// SQLite URL (`"sqlite:./audit.db?mode=rwc"`).
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let url = if path.starts_with("sqlite:") {
            path.to_string()
        } else {
            format!("sqlite:{path}?mode=rwc")
        };

        let pool = SqlitePool::connect(&url).await.map_err(db)?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Open an in-memory SQLite database.
    ///
    /// All data is lost when the pool is dropped. Ideal for tests.
    pub async fn in_memory() -> Result<Self, StoreError> {
        // Every connection to `:memory:` is a separate database.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(db)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create tables and enable WAL mode.
    async fn init_schema(&self) -> Result<(), StoreError> {
        // WAL: readers do not block the writer
        sqlx::query("PRAGMA journal_mode=WAL;")
            .execute(&self.pool)
            .await
            .map_err(db)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS events (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                event_type  TEXT    NOT NULL,
                subject     TEXT    NOT NULL,
                fields_json TEXT    NOT NULL,
                signature   TEXT    NOT NULL UNIQUE,
                slot        INTEGER NOT NULL,
                captured_at TEXT    NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS operations (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                operation   TEXT    NOT NULL,
                subject     TEXT    NOT NULL,
                actor       TEXT    NOT NULL,
                amount      TEXT,
                target      TEXT,
                signature   TEXT    NOT NULL UNIQUE,
                status      TEXT    NOT NULL,
                recorded_at TEXT    NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS webhooks (
                id          TEXT    PRIMARY KEY,
                url         TEXT    NOT NULL,
                events_json TEXT    NOT NULL,
                secret      TEXT,
                active      INTEGER NOT NULL,
                created_at  TEXT    NOT NULL
            );",
        )
        .execute(&self.pool)
        .await
        .map_err(db)?;

        // Indexes for the subject-scoped, newest-first listings
        sqlx::query("CREATE INDEX IF NOT EXISTS idx_events_subject ON events (subject, slot);")
            .execute(&self.pool)
            .await
            .map_err(db)?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_operations_subject ON operations (subject);")
            .execute(&self.pool)
            .await
            .map_err(db)?;

        Ok(())
    }

    /// Total number of stored events.
    pub async fn event_count(&self) -> Result<u64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as cnt FROM events")
            .fetch_one(&self.pool)
            .await
            .map_err(db)?;
        let cnt: i64 = row.try_get("cnt").map_err(db)?;
        Ok(cnt as u64)
    }
}

fn event_from_row(row: &SqliteRow) -> Result<EventRecord, StoreError> {
    let fields: String = row.try_get("fields_json").map_err(db)?;
    Ok(EventRecord {
        id: row.try_get("id").map_err(db)?,
        event_type: row.try_get("event_type").map_err(db)?,
        subject: row.try_get("subject").map_err(db)?,
        fields: serde_json::from_str(&fields)?,
        signature: row.try_get("signature").map_err(db)?,
        slot: row.try_get::<i64, _>("slot").map_err(db)? as u64,
        captured_at: row.try_get::<DateTime<Utc>, _>("captured_at").map_err(db)?,
    })
}

fn operation_from_row(row: &SqliteRow) -> Result<StoredOperation, StoreError> {
    let status: String = row.try_get("status").map_err(db)?;
    Ok(StoredOperation {
        id: row.try_get("id").map_err(db)?,
        record: OperationRecord {
            operation: row.try_get("operation").map_err(db)?,
            subject: row.try_get("subject").map_err(db)?,
            actor: row.try_get("actor").map_err(db)?,
            amount: row.try_get("amount").map_err(db)?,
            target: row.try_get("target").map_err(db)?,
            signature: row.try_get("signature").map_err(db)?,
            status: status.parse().map_err(StoreError::Database)?,
        },
        recorded_at: row.try_get::<DateTime<Utc>, _>("recorded_at").map_err(db)?,
    })
}

fn webhook_from_row(row: &SqliteRow) -> Result<WebhookRegistration, StoreError> {
    let id: String = row.try_get("id").map_err(db)?;
    let events: String = row.try_get("events_json").map_err(db)?;
    Ok(WebhookRegistration {
        id: Uuid::parse_str(&id).map_err(|e| StoreError::Database(e.to_string()))?,
        url: row.try_get("url").map_err(db)?,
        events: serde_json::from_str(&events)?,
        secret: row.try_get("secret").map_err(db)?,
        active: row.try_get::<i64, _>("active").map_err(db)? != 0,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db)?,
    })
}

// ─── AuditStore impl ─────────────────────────────────────────────────────────

#[async_trait]
impl AuditStore for SqliteStore {
    async fn record_event(&self, event: &DecodedEvent) -> Result<bool, StoreError> {
        let fields = serde_json::to_string(&event.fields_json())?;

        let result = sqlx::query(
            "INSERT INTO events (event_type, subject, fields_json, signature, slot, captured_at)
             VALUES (?, ?, ?, ?, ?, ?)
             ON CONFLICT(signature) DO NOTHING",
        )
        .bind(event.kind.name())
        .bind(&event.subject)
        .bind(&fields)
        .bind(&event.signature)
        .bind(event.slot as i64)
        .bind(event.captured_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        let inserted = result.rows_affected() == 1;
        debug!(
            event = event.kind.name(),
            signature = %event.signature,
            slot = event.slot,
            inserted,
            "event recorded"
        );
        Ok(inserted)
    }

    async fn record_operation(&self, op: &OperationRecord) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "INSERT INTO operations
             (operation, subject, actor, amount, target, signature, status, recorded_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(signature) DO NOTHING",
        )
        .bind(&op.operation)
        .bind(&op.subject)
        .bind(&op.actor)
        .bind(&op.amount)
        .bind(&op.target)
        .bind(&op.signature)
        .bind(op.status.to_string())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(db)?;

        Ok(result.rows_affected() == 1)
    }

    async fn list_events(
        &self,
        subject: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<EventRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, event_type, subject, fields_json, signature, slot, captured_at
             FROM events
             WHERE (?1 IS NULL OR subject = ?1)
             ORDER BY slot DESC, id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(subject)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(event_from_row).collect()
    }

    async fn list_operations(
        &self,
        subject: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<StoredOperation>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, operation, subject, actor, amount, target, signature, status, recorded_at
             FROM operations
             WHERE (?1 IS NULL OR subject = ?1)
             ORDER BY id DESC
             LIMIT ?2 OFFSET ?3",
        )
        .bind(subject)
        .bind(limit as i64)
        .bind(offset as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(operation_from_row).collect()
    }
}

// ─── WebhookStore impl ───────────────────────────────────────────────────────

#[async_trait]
impl WebhookStore for SqliteStore {
    async fn insert_webhook(&self, hook: &WebhookRegistration) -> Result<(), StoreError> {
        let events = serde_json::to_string(&hook.events)?;
        sqlx::query(
            "INSERT INTO webhooks (id, url, events_json, secret, active, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(hook.id.to_string())
        .bind(&hook.url)
        .bind(&events)
        .bind(&hook.secret)
        .bind(hook.active as i64)
        .bind(hook.created_at)
        .execute(&self.pool)
        .await
        .map_err(db)?;

        debug!(id = %hook.id, url = %hook.url, "webhook stored");
        Ok(())
    }

    async fn list_webhooks(&self) -> Result<Vec<WebhookRegistration>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, url, events_json, secret, active, created_at
             FROM webhooks ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(db)?;

        rows.iter().map(webhook_from_row).collect()
    }

    async fn remove_webhook(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM webhooks WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_webhook_active(&self, id: Uuid, active: bool) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE webhooks SET active = ? WHERE id = ?")
            .bind(active as i64)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(db)?;
        Ok(result.rows_affected() > 0)
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use sss_core::{project, EventKind, FieldValue, Fields, Pubkey};

    fn minted(sig: &str, slot: u64) -> DecodedEvent {
        let stablecoin = Pubkey::new_from_array([1; 32]);
        let mut fields = Fields::new();
        fields.insert("stablecoin".into(), FieldValue::Pubkey(stablecoin));
        fields.insert("minter".into(), FieldValue::Pubkey(Pubkey::new_from_array([2; 32])));
        fields.insert("recipient".into(), FieldValue::Pubkey(Pubkey::new_from_array([3; 32])));
        fields.insert("amount".into(), FieldValue::U64(u64::MAX));
        fields.insert("total_minted".into(), FieldValue::U64(u64::MAX));
        fields.insert("timestamp".into(), FieldValue::I64(1_700_000_000));
        DecodedEvent {
            kind: EventKind::TokensMinted,
            fields,
            subject: stablecoin.to_string(),
            signature: sig.into(),
            slot,
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn event_roundtrip_keeps_full_u64() {
        let store = SqliteStore::in_memory().await.unwrap();
        let ev = minted("sig-a", 77);
        assert!(store.record_event(&ev).await.unwrap());

        let rows = store.list_events(Some(&ev.subject), 10, 0).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].event_type, "TokensMinted");
        assert_eq!(rows[0].slot, 77);
        assert_eq!(rows[0].fields["amount"], "18446744073709551615");
        assert_eq!(rows[0].fields, ev.fields_json());
    }

    #[tokio::test]
    async fn duplicate_signature_is_a_no_op() {
        let store = SqliteStore::in_memory().await.unwrap();
        let ev = minted("sig-dup", 1);
        assert!(store.record_event(&ev).await.unwrap());
        assert!(!store.record_event(&ev).await.unwrap());
        assert_eq!(store.event_count().await.unwrap(), 1);

        let op = project(ev.kind, &ev.fields, &ev.signature);
        assert!(store.record_operation(&op).await.unwrap());
        assert!(!store.record_operation(&op).await.unwrap());
        let ops = store.list_operations(None, 10, 0).await.unwrap();
        assert_eq!(ops.len(), 1);
        assert_eq!(ops[0].record, op);
    }

    #[tokio::test]
    async fn concurrent_duplicate_inserts_store_one_row() {
        let path = std::env::temp_dir().join(format!("sss-store-{}.db", Uuid::new_v4()));
        let store = std::sync::Arc::new(SqliteStore::open(&path.display().to_string()).await.unwrap());
        let ev = minted("sig-race", 5);

        let inserts: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                let ev = ev.clone();
                tokio::spawn(async move { store.record_event(&ev).await })
            })
            .collect();
        let mut fresh = 0;
        for insert in inserts {
            if insert.await.unwrap().unwrap() {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert_eq!(store.event_count().await.unwrap(), 1);

        let (a, b) = tokio::join!(store.record_event(&ev), store.record_event(&ev));
        assert!(!a.unwrap() && !b.unwrap());

        drop(store);
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn newest_first_and_paginated() {
        let store = SqliteStore::in_memory().await.unwrap();
        for (sig, slot) in [("a", 10u64), ("b", 30), ("c", 20)] {
            store.record_event(&minted(sig, slot)).await.unwrap();
        }
        let page: Vec<String> = store
            .list_events(None, 2, 0)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.signature)
            .collect();
        assert_eq!(page, vec!["b", "c"]);

        let rest = store.list_events(None, 2, 2).await.unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].signature, "a");

        assert!(store.list_events(Some("nobody"), 10, 0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn webhook_persistence() {
        let store = SqliteStore::in_memory().await.unwrap();
        let hook = WebhookRegistration::new(
            "https://example.com/hook",
            vec!["TokensMinted".into(), "TokensBurned".into()],
            Some("s3cret".into()),
        );
        store.insert_webhook(&hook).await.unwrap();

        let listed = store.list_webhooks().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].events, hook.events);
        assert_eq!(listed[0].secret.as_deref(), Some("s3cret"));
        assert!(listed[0].active);

        assert!(store.set_webhook_active(hook.id, false).await.unwrap());
        assert!(!store.list_webhooks().await.unwrap()[0].active);

        assert!(store.remove_webhook(hook.id).await.unwrap());
        assert!(!store.remove_webhook(hook.id).await.unwrap());
    }
}
