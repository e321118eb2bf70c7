//! # sss-core
//!
//! Core types shared across the SSS token indexer crates.
//! The codec, stream listener, audit store, and webhook dispatcher are all
//! built on top of the primitives defined here.

pub mod error;
pub mod event;
pub mod operation;
pub mod pubkey;
pub mod webhook;

pub use error::{CodecError, DecodeError, StoreError, StreamError, WebhookError};
pub use event::{DecodedEvent, EventKind, FieldKind, FieldValue, Fields, LogNotification};
pub use operation::{project, OperationRecord, OperationStatus};
pub use pubkey::Pubkey;
pub use webhook::{WebhookRegistration, WILDCARD};
