//! Error types for the encode / decode / index pipeline.

use thiserror::Error;

/// Errors raised while encoding instructions or deriving addresses.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("Invalid public key '{input}': {reason}")]
    InvalidPubkey { input: String, reason: String },

    #[error("Seed set exceeds limits: {reason}")]
    MaxSeedLengthExceeded { reason: String },

    #[error("No viable bump seed found for program {program}")]
    NoViableBump { program: String },

    #[error("Derived address lies on the ed25519 curve")]
    OnCurve,

    #[error("Unknown operation: {name}")]
    UnknownOperation { name: String },

    #[error("Invalid argument '{arg}': {reason}")]
    InvalidArgument { arg: String, reason: String },

    #[error("Serialization failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while decoding a recognized event payload.
///
/// Unrecognized discriminators are not errors; see `DecodeOutcome` in `sss-codec`.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Payload for {event} too short while reading '{field}' ({kind})")]
    BufferTooShort {
        event: String,
        field: String,
        kind: String,
    },

    #[error("Invalid UTF-8 in '{field}' of {event}")]
    InvalidUtf8 { event: String, field: String },

    #[error("Invalid boolean byte {byte} in '{field}' of {event}")]
    InvalidBool { event: String, field: String, byte: u8 },
}

/// Errors from the log subscription transport.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("RPC connection failed: {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    #[error("Subscription rejected: {reason}")]
    SubscriptionRejected { reason: String },

    #[error("Stream closed unexpectedly")]
    Closed,

    #[error("Listener already running")]
    AlreadyRunning,

    #[error("{0}")]
    Other(String),
}

/// Errors from the audit / webhook registration store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// Errors from webhook registration and delivery.
#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Invalid webhook URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid event subscription: {reason}")]
    InvalidEvents { reason: String },

    #[error("Delivery to {url} failed with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Delivery to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
