//! `EventSink` — where the listener hands decoded events.

use async_trait::async_trait;
use sss_core::DecodedEvent;

/// Per-notification extraction counts, reported before its events.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotificationSummary {
    pub signature: String,
    pub slot: u64,
    /// The transaction failed on-chain; nothing was extracted.
    pub failed: bool,
    pub decoded: usize,
    pub unrecognized: usize,
    pub decode_errors: usize,
}

/// Consumer of decoded events.
///
/// `on_event` must handle its own failures; the listener keeps going
/// regardless of what happens inside it.
#[async_trait]
pub trait EventSink: Send + Sync {
    async fn on_event(&self, event: DecodedEvent);

    fn on_notification(&self, _summary: &NotificationSummary) {}
}
