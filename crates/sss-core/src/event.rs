//! Raw log notifications and decoded program events.

use crate::pubkey::Pubkey;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A single `logsNotification` as delivered by the RPC node.
/// This is the input to the event extraction step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogNotification {
    /// Base58 transaction signature
    pub signature: String,
    /// Slot the notification was observed at
    pub slot: u64,
    /// Transaction-level error, if the transaction failed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub err: Option<serde_json::Value>,
    /// Program log lines, in emission order
    pub logs: Vec<String>,
}

impl LogNotification {
    /// Returns `true` if the transaction failed on-chain.
    pub fn is_failed(&self) -> bool {
        self.err.as_ref().map(|e| !e.is_null()).unwrap_or(false)
    }
}

/// The closed set of events emitted by the stablecoin program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventKind {
    StablecoinInitialized,
    TokensMinted,
    TokensBurned,
    AccountFrozen,
    AccountThawed,
    StablecoinPaused,
    StablecoinUnpaused,
    RolesUpdated,
    MinterUpdated,
    AuthorityTransferred,
    AddedToBlacklist,
    RemovedFromBlacklist,
    TokensSeized,
}

impl EventKind {
    pub const ALL: [EventKind; 13] = [
        EventKind::StablecoinInitialized,
        EventKind::TokensMinted,
        EventKind::TokensBurned,
        EventKind::AccountFrozen,
        EventKind::AccountThawed,
        EventKind::StablecoinPaused,
        EventKind::StablecoinUnpaused,
        EventKind::RolesUpdated,
        EventKind::MinterUpdated,
        EventKind::AuthorityTransferred,
        EventKind::AddedToBlacklist,
        EventKind::RemovedFromBlacklist,
        EventKind::TokensSeized,
    ];

    /// The event's declared name, as hashed into its discriminator.
    pub fn name(self) -> &'static str {
        match self {
            EventKind::StablecoinInitialized => "StablecoinInitialized",
            EventKind::TokensMinted => "TokensMinted",
            EventKind::TokensBurned => "TokensBurned",
            EventKind::AccountFrozen => "AccountFrozen",
            EventKind::AccountThawed => "AccountThawed",
            EventKind::StablecoinPaused => "StablecoinPaused",
            EventKind::StablecoinUnpaused => "StablecoinUnpaused",
            EventKind::RolesUpdated => "RolesUpdated",
            EventKind::MinterUpdated => "MinterUpdated",
            EventKind::AuthorityTransferred => "AuthorityTransferred",
            EventKind::AddedToBlacklist => "AddedToBlacklist",
            EventKind::RemovedFromBlacklist => "RemovedFromBlacklist",
            EventKind::TokensSeized => "TokensSeized",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| format!("unknown event type '{s}'"))
    }
}

/// Primitive wire type of a single event field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Pubkey,
    U8,
    U64,
    I64,
    Bool,
    Str,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FieldKind::Pubkey => "pubkey",
            FieldKind::U8 => "u8",
            FieldKind::U64 => "u64",
            FieldKind::I64 => "i64",
            FieldKind::Bool => "bool",
            FieldKind::Str => "string",
        };
        f.write_str(s)
    }
}

/// A decoded field value.
///
/// Serializes integers as decimal strings so the full 64-bit range survives
/// JSON consumers that parse numbers as doubles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Pubkey(Pubkey),
    U8(u8),
    U64(u64),
    I64(i64),
    Bool(bool),
    Str(String),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Pubkey(_) => FieldKind::Pubkey,
            FieldValue::U8(_) => FieldKind::U8,
            FieldValue::U64(_) => FieldKind::U64,
            FieldValue::I64(_) => FieldKind::I64,
            FieldValue::Bool(_) => FieldKind::Bool,
            FieldValue::Str(_) => FieldKind::Str,
        }
    }

    pub fn as_pubkey(&self) -> Option<&Pubkey> {
        match self {
            FieldValue::Pubkey(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self {
            FieldValue::U64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            FieldValue::Bool(b) => serde_json::Value::Bool(*b),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Pubkey(p) => write!(f, "{p}"),
            FieldValue::U8(v) => write!(f, "{v}"),
            FieldValue::U64(v) => write!(f, "{v}"),
            FieldValue::I64(v) => write!(f, "{v}"),
            FieldValue::Bool(v) => write!(f, "{v}"),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Bool(b) => serializer.serialize_bool(*b),
            FieldValue::Str(s) => serializer.serialize_str(s),
            other => serializer.collect_str(other),
        }
    }
}

/// Decoded fields keyed by schema field name, in wire order.
pub type Fields = IndexMap<String, FieldValue>;

/// A fully decoded program event together with its capture context.
#[derive(Debug, Clone, Serialize)]
pub struct DecodedEvent {
    /// Which event this is
    pub kind: EventKind,
    /// Decoded field values keyed by field name
    pub fields: Fields,
    /// The stablecoin record this event is about (base58)
    pub subject: String,
    /// Transaction signature
    pub signature: String,
    /// Slot the transaction landed in
    pub slot: u64,
    /// Wall-clock time the indexer captured the event
    pub captured_at: DateTime<Utc>,
}

impl DecodedEvent {
    /// Get a field value by name.
    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// Field map as a JSON object, preserving wire order.
    pub fn fields_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.fields
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}
