//! sss-webhook — outbound event notifications.
//!
//! Subscribers register a URL plus the event names they care about (or `"*"`).
//! Every newly indexed event is POSTed as
//! `{"event": <name>, "data": <fields>, "timestamp": <RFC 3339>}`,
//! signed with HMAC-SHA256 when the registration carries a secret.

pub mod dispatcher;
pub mod signature;

pub use dispatcher::{DispatchReport, DispatcherConfig, WebhookDispatcher};
pub use signature::{sign, verify, EVENT_HEADER, SIGNATURE_HEADER};
