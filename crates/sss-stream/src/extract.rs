//! Per-notification event extraction.

use crate::sink::NotificationSummary;
use chrono::Utc;
use sss_codec::{DecodeOutcome, EventDecoder, ProgramLogScanner};
use sss_core::{DecodedEvent, FieldValue, LogNotification};
use tracing::{debug, warn};

/// Events pulled out of one notification, plus what was skipped.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub events: Vec<DecodedEvent>,
    pub summary: NotificationSummary,
}

/// Decode every event our program emitted in `notification`.
///
/// Failed transactions yield nothing. A payload that fails to decode is
/// logged and skipped; the remaining lines are still processed.
pub fn extract_events(
    notification: &LogNotification,
    scanner: &ProgramLogScanner,
    decoder: &EventDecoder,
) -> Extraction {
    let mut out = Extraction {
        events: Vec::new(),
        summary: NotificationSummary {
            signature: notification.signature.clone(),
            slot: notification.slot,
            ..Default::default()
        },
    };

    if notification.is_failed() {
        debug!(signature = %notification.signature, "skipping failed transaction");
        out.summary.failed = true;
        return out;
    }

    let captured_at = Utc::now();
    for payload in scanner.event_payloads(&notification.logs) {
        match decoder.decode(&payload) {
            Ok(DecodeOutcome::Decoded { kind, fields }) => {
                let subject = match fields.get("stablecoin") {
                    Some(FieldValue::Pubkey(p)) => p.to_string(),
                    _ => String::new(),
                };
                out.events.push(DecodedEvent {
                    kind,
                    fields,
                    subject,
                    signature: notification.signature.clone(),
                    slot: notification.slot,
                    captured_at,
                });
            }
            Ok(DecodeOutcome::Unrecognized) => out.summary.unrecognized += 1,
            Err(e) => {
                warn!(
                    signature = %notification.signature,
                    slot = notification.slot,
                    error = %e,
                    "dropping malformed event payload"
                );
                out.summary.decode_errors += 1;
            }
        }
    }
    out.summary.decoded = out.events.len();
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sss_codec::{constants::SSS_TOKEN_PROGRAM_ID, EventSchema};
    use sss_core::{EventKind, Fields, Pubkey};

    const BURNED: &str = "Program data: 5v8iceI14wkBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQEBAQICAgICAgICAgICAgICAgICAgICAgICAgICAgICAgICQEIPAAAAAABAS0wAAAAAAADxU2UAAAAA";

    fn paused_line() -> String {
        let mut fields = Fields::new();
        fields.insert("stablecoin".into(), FieldValue::Pubkey(Pubkey::new_from_array([3; 32])));
        fields.insert("paused_by".into(), FieldValue::Pubkey(Pubkey::new_from_array([4; 32])));
        fields.insert("timestamp".into(), FieldValue::I64(1));
        let bytes = EventSchema::of(EventKind::StablecoinPaused).encode(&fields).unwrap();
        use base64::Engine as _;
        format!("Program data: {}", base64::engine::general_purpose::STANDARD.encode(bytes))
    }

    fn notification(logs: Vec<String>) -> LogNotification {
        LogNotification {
            signature: "sig-1".into(),
            slot: 42,
            err: None,
            logs,
        }
    }

    fn run(n: &LogNotification) -> Extraction {
        extract_events(n, &ProgramLogScanner::new(&SSS_TOKEN_PROGRAM_ID), &EventDecoder::new())
    }

    #[test]
    fn extracts_event_with_context() {
        let out = run(&notification(vec![BURNED.into()]));
        assert_eq!(out.events.len(), 1);
        let ev = &out.events[0];
        assert_eq!(ev.kind, EventKind::TokensBurned);
        assert_eq!(ev.subject, "4vJ9JU1bJJE96FWSJKvHsmmFADCg4gpZQff4P3bkLKi");
        assert_eq!(ev.signature, "sig-1");
        assert_eq!(ev.slot, 42);
        assert_eq!(out.summary.decoded, 1);
    }

    #[test]
    fn failed_transaction_yields_nothing() {
        let mut n = notification(vec![BURNED.into()]);
        n.err = Some(serde_json::json!({"InstructionError": [0, "InvalidArgument"]}));
        let out = run(&n);
        assert!(out.events.is_empty());
        assert!(out.summary.failed);
    }

    #[test]
    fn bad_lines_do_not_block_later_lines() {
        let truncated = &BURNED[..BURNED.len() - 12];
        let logs = vec![
            "Program data: 3q2+7wAAAAAAAA==".to_string(),
            format!("{truncated}AAAAAAAA"),
            "Program data: ***".to_string(),
            paused_line(),
        ];
        let out = run(&notification(logs));
        assert_eq!(out.events.len(), 1);
        assert_eq!(out.events[0].kind, EventKind::StablecoinPaused);
        assert_eq!(out.summary.unrecognized, 1);
        assert_eq!(out.summary.decode_errors, 1);
    }
}
