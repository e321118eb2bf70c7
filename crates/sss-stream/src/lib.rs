//! # sss-stream
//!
//! Live capture of SSS program events from a Solana `logsSubscribe` stream.
//!
//! ```text
//! LogSource ──► LogNotification ──► extract_events() ──► EventSink
//!  (ws / broadcast)                 (scanner + decoder)   (store, webhooks)
//! ```
//!
//! `LogStreamListener` owns the subscription and moves between the
//! `Stopped` and `Subscribed` states via `start()` / `stop()`. It never
//! reconnects on its own; a supervisor restarts it after a transport error.

pub mod extract;
pub mod listener;
pub mod sink;
pub mod source;
pub mod ws;

pub use extract::{extract_events, Extraction};
pub use listener::LogStreamListener;
pub use sink::{EventSink, NotificationSummary};
pub use source::{BroadcastLogSource, LogSource, LogStream};
pub use ws::{Commitment, SolanaWsLogSource};
