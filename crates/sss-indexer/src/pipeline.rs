//! `EventPipeline` — the listener's sink: store, project, notify.
//!
//! For every decoded event:
//! 1. insert the event row (idempotent on signature)
//! 2. on a fresh insert only, insert its operation projection and
//!    dispatch webhooks
//!
//! A redelivered transaction is therefore stored once and notified once.
//! Store or delivery failures are logged and counted; they never stop the
//! listener.

use crate::metrics::PipelineMetrics;
use async_trait::async_trait;
use sss_core::{project, DecodedEvent};
use sss_store::AuditStore;
use sss_stream::{EventSink, NotificationSummary};
use sss_webhook::WebhookDispatcher;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub struct EventPipeline {
    audit: Arc<dyn AuditStore>,
    dispatcher: Arc<WebhookDispatcher>,
    metrics: Arc<PipelineMetrics>,
}

impl EventPipeline {
    pub fn new(
        audit: Arc<dyn AuditStore>,
        dispatcher: Arc<WebhookDispatcher>,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        Self {
            audit,
            dispatcher,
            metrics,
        }
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }
}

/// Webhook `data` for an event: its fields plus transaction context.
pub fn webhook_payload(event: &DecodedEvent) -> serde_json::Value {
    let mut data = event.fields_json();
    if let Some(obj) = data.as_object_mut() {
        obj.insert("signature".into(), event.signature.clone().into());
        obj.insert("slot".into(), event.slot.into());
    }
    data
}

#[async_trait]
impl EventSink for EventPipeline {
    async fn on_event(&self, event: DecodedEvent) {
        self.metrics.record_decoded();
        let name = event.kind.name();

        match self.audit.record_event(&event).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(signature = %event.signature, event = name, "already indexed, skipping");
                self.metrics.record_duplicate();
                return;
            }
            Err(e) => {
                error!(signature = %event.signature, event = name, error = %e, "failed to store event");
                self.metrics.record_store_error();
                return;
            }
        }

        let op = project(event.kind, &event.fields, &event.signature);
        if let Err(e) = self.audit.record_operation(&op).await {
            // The event row is in; the projection can be rebuilt from it.
            warn!(signature = %event.signature, operation = %op.operation, error = %e, "failed to store operation");
            self.metrics.record_store_error();
        }

        info!(
            signature = %event.signature,
            slot = event.slot,
            event = name,
            subject = %event.subject,
            "event indexed"
        );

        let report = self.dispatcher.dispatch(name, &webhook_payload(&event)).await;
        self.metrics.record_dispatch(report.delivered, report.failed);
    }

    fn on_notification(&self, summary: &NotificationSummary) {
        self.metrics
            .record_notification(summary.failed, summary.unrecognized, summary.decode_errors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sss_core::{EventKind, FieldValue, Fields, Pubkey};
    use sss_store::MemoryStore;
    use sss_webhook::DispatcherConfig;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn paused(signature: &str) -> DecodedEvent {
        let subject = Pubkey::new_from_array([1; 32]);
        let mut fields = Fields::new();
        fields.insert("stablecoin".into(), FieldValue::Pubkey(subject));
        fields.insert("paused_by".into(), FieldValue::Pubkey(Pubkey::new_from_array([2; 32])));
        fields.insert("timestamp".into(), FieldValue::I64(1_700_000_000));
        DecodedEvent {
            kind: EventKind::StablecoinPaused,
            fields,
            subject: subject.to_string(),
            signature: signature.into(),
            slot: 12,
            captured_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn dispatches_through_sink_trait_object() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let store = Arc::new(MemoryStore::new());
        let dispatcher =
            Arc::new(WebhookDispatcher::new(store.clone(), &DispatcherConfig::default()).unwrap());
        dispatcher.register(&server.uri(), vec!["StablecoinPaused".into()], None).await.unwrap();

        let metrics = Arc::new(PipelineMetrics::new());
        let sink: Arc<dyn EventSink> =
            Arc::new(EventPipeline::new(store.clone(), dispatcher, metrics.clone()));

        let task = tokio::spawn({
            let sink = Arc::clone(&sink);
            async move {
                sink.on_event(paused("sig-p")).await;
                sink.on_event(paused("sig-p")).await;
            }
        });
        task.await.unwrap();

        let m = metrics.snapshot();
        assert_eq!(m.events_decoded, 2);
        assert_eq!(m.duplicates, 1);
        assert_eq!(m.webhook_deliveries, 1);
        assert_eq!(store.event_count(), 1);
        assert_eq!(store.operation_count(), 1);
    }

    #[test]
    fn payload_carries_transaction_context() {
        let data = webhook_payload(&paused("sig-x"));
        assert_eq!(data["signature"], "sig-x");
        assert_eq!(data["slot"], 12);
        assert_eq!(data["timestamp"], "1700000000");
    }
}
