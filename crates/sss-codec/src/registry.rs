//! Event schema registry.
//!
//! The stablecoin program emits a closed set of thirteen events. Each has a
//! fixed field layout, declared here as static data with one arm per
//! `EventKind`, so a new event kind fails to compile until its layout is
//! added. `EventRegistry` is the discriminator → kind index used on the
//! decode path.

use crate::discriminator::{event_discriminator, Discriminator};
use borsh::BorshSerialize;
use sss_core::{CodecError, EventKind, FieldKind, Fields, FieldValue};
use std::collections::HashMap;
use std::sync::OnceLock;

use sss_core::FieldKind::{Bool, Pubkey as Key, Str, I64, U64};

/// Ordered field layout of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventSchema {
    pub kind: EventKind,
    /// `(field name, wire type)` in declaration order
    pub fields: &'static [(&'static str, FieldKind)],
}

const STABLECOIN_INITIALIZED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("mint", Key),
    ("authority", Key),
    ("name", Str),
    ("symbol", Str),
    ("is_sss2", Bool),
    ("timestamp", I64),
];

const TOKENS_MINTED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("minter", Key),
    ("recipient", Key),
    ("amount", U64),
    ("total_minted", U64),
    ("timestamp", I64),
];

const TOKENS_BURNED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("burner", Key),
    ("amount", U64),
    ("total_burned", U64),
    ("timestamp", I64),
];

const ACCOUNT_FROZEN: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("account", Key),
    ("frozen_by", Key),
    ("timestamp", I64),
];

const ACCOUNT_THAWED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("account", Key),
    ("thawed_by", Key),
    ("timestamp", I64),
];

const STABLECOIN_PAUSED: &[(&str, FieldKind)] =
    &[("stablecoin", Key), ("paused_by", Key), ("timestamp", I64)];

const STABLECOIN_UNPAUSED: &[(&str, FieldKind)] =
    &[("stablecoin", Key), ("unpaused_by", Key), ("timestamp", I64)];

const ROLES_UPDATED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("holder", Key),
    ("is_minter", Bool),
    ("is_burner", Bool),
    ("is_pauser", Bool),
    ("is_blacklister", Bool),
    ("is_seizer", Bool),
    ("updated_by", Key),
    ("timestamp", I64),
];

const MINTER_UPDATED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("minter", Key),
    ("new_quota", U64),
    ("updated_by", Key),
    ("timestamp", I64),
];

const AUTHORITY_TRANSFERRED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("previous_authority", Key),
    ("new_authority", Key),
    ("timestamp", I64),
];

const ADDED_TO_BLACKLIST: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("address", Key),
    ("reason", Str),
    ("blacklisted_by", Key),
    ("timestamp", I64),
];

const REMOVED_FROM_BLACKLIST: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("address", Key),
    ("removed_by", Key),
    ("timestamp", I64),
];

const TOKENS_SEIZED: &[(&str, FieldKind)] = &[
    ("stablecoin", Key),
    ("from", Key),
    ("to", Key),
    ("amount", U64),
    ("seized_by", Key),
    ("timestamp", I64),
];

impl EventSchema {
    /// The layout of `kind`.
    pub const fn of(kind: EventKind) -> EventSchema {
        let fields = match kind {
            EventKind::StablecoinInitialized => STABLECOIN_INITIALIZED,
            EventKind::TokensMinted => TOKENS_MINTED,
            EventKind::TokensBurned => TOKENS_BURNED,
            EventKind::AccountFrozen => ACCOUNT_FROZEN,
            EventKind::AccountThawed => ACCOUNT_THAWED,
            EventKind::StablecoinPaused => STABLECOIN_PAUSED,
            EventKind::StablecoinUnpaused => STABLECOIN_UNPAUSED,
            EventKind::RolesUpdated => ROLES_UPDATED,
            EventKind::MinterUpdated => MINTER_UPDATED,
            EventKind::AuthorityTransferred => AUTHORITY_TRANSFERRED,
            EventKind::AddedToBlacklist => ADDED_TO_BLACKLIST,
            EventKind::RemovedFromBlacklist => REMOVED_FROM_BLACKLIST,
            EventKind::TokensSeized => TOKENS_SEIZED,
        };
        EventSchema { kind, fields }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// `sha256("event:<Name>")[..8]`
    pub fn discriminator(&self) -> Discriminator {
        event_discriminator(self.kind.name())
    }

    /// Minimum payload size after the discriminator (strings counted as empty).
    pub fn min_len(&self) -> usize {
        self.fields
            .iter()
            .map(|(_, kind)| match kind {
                FieldKind::Pubkey => 32,
                FieldKind::U8 | FieldKind::Bool => 1,
                FieldKind::U64 | FieldKind::I64 => 8,
                FieldKind::Str => 4,
            })
            .sum()
    }

    /// Encode `fields` as the program would emit them: discriminator followed
    /// by each field in schema order. Used to build fixtures and to check
    /// decode round-trips.
    pub fn encode(&self, fields: &Fields) -> Result<Vec<u8>, CodecError> {
        let mut out = self.discriminator().to_vec();
        for (name, kind) in self.fields {
            let value = fields.get(*name).ok_or_else(|| CodecError::InvalidArgument {
                arg: (*name).into(),
                reason: format!("missing from {} payload", self.name()),
            })?;
            if value.kind() != *kind {
                return Err(CodecError::InvalidArgument {
                    arg: (*name).into(),
                    reason: format!("expected {kind}, got {}", value.kind()),
                });
            }
            match value {
                FieldValue::Pubkey(p) => p.serialize(&mut out)?,
                FieldValue::U8(v) => v.serialize(&mut out)?,
                FieldValue::U64(v) => v.serialize(&mut out)?,
                FieldValue::I64(v) => v.serialize(&mut out)?,
                FieldValue::Bool(v) => v.serialize(&mut out)?,
                FieldValue::Str(s) => s.serialize(&mut out)?,
            }
        }
        Ok(out)
    }
}

/// Discriminator → event kind index.
#[derive(Debug, Clone)]
pub struct EventRegistry {
    by_discriminator: HashMap<Discriminator, EventKind>,
}

impl EventRegistry {
    pub fn new() -> Self {
        let by_discriminator = EventKind::ALL
            .into_iter()
            .map(|kind| (EventSchema::of(kind).discriminator(), kind))
            .collect();
        Self { by_discriminator }
    }

    /// Process-wide registry, built on first use.
    pub fn global() -> &'static EventRegistry {
        static REGISTRY: OnceLock<EventRegistry> = OnceLock::new();
        REGISTRY.get_or_init(EventRegistry::new)
    }

    /// Look up the schema for a discriminator. `None` means unrecognized.
    pub fn lookup(&self, discriminator: &Discriminator) -> Option<EventSchema> {
        self.by_discriminator
            .get(discriminator)
            .map(|kind| EventSchema::of(*kind))
    }

    pub fn len(&self) -> usize {
        self.by_discriminator.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_discriminator.is_empty()
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thirteen_distinct_discriminators() {
        assert_eq!(EventRegistry::global().len(), 13);
    }

    #[test]
    fn every_schema_is_about_a_stablecoin() {
        for kind in EventKind::ALL {
            let schema = EventSchema::of(kind);
            assert_eq!(schema.kind, kind);
            assert_eq!(schema.fields[0], ("stablecoin", FieldKind::Pubkey));
            assert_eq!(schema.fields.last().map(|f| f.0), Some("timestamp"));
        }
    }

    #[test]
    fn known_discriminators() {
        let registry = EventRegistry::new();
        let cases = [
            ("eed9870e9321dda9", EventKind::StablecoinInitialized),
            ("cfd480c2af364018", EventKind::TokensMinted),
            ("e6ff2271e235e309", EventKind::TokensBurned),
            ("ddd63b1df63277ce", EventKind::AccountFrozen),
            ("313f496981be2877", EventKind::AccountThawed),
            ("487b10bb32d652c6", EventKind::StablecoinPaused),
            ("b750413c806d9b9b", EventKind::StablecoinUnpaused),
            ("5125b0201eccfbf6", EventKind::RolesUpdated),
            ("087c422db0353199", EventKind::MinterUpdated),
            ("f56db336875c1640", EventKind::AuthorityTransferred),
            ("03c44e886fc5bc72", EventKind::AddedToBlacklist),
            ("37881941c7249221", EventKind::RemovedFromBlacklist),
            ("33818372ceea8c7a", EventKind::TokensSeized),
        ];
        for (hex_disc, kind) in cases {
            let mut disc = [0u8; 8];
            disc.copy_from_slice(&hex::decode(hex_disc).unwrap());
            assert_eq!(registry.lookup(&disc).map(|s| s.kind), Some(kind), "{hex_disc}");
        }
        assert!(registry.lookup(&[0u8; 8]).is_none());
    }

    #[test]
    fn min_len_counts_fixed_fields() {
        // 2 pubkeys + 2 u64 + 1 i64
        assert_eq!(EventSchema::of(EventKind::TokensBurned).min_len(), 96 - 8);
        // 3 pubkeys + 2 strings + bool + i64
        assert_eq!(EventSchema::of(EventKind::StablecoinInitialized).min_len(), 96 + 8 + 1 + 8);
    }

    #[test]
    fn encode_rejects_wrong_field_type() {
        let schema = EventSchema::of(EventKind::StablecoinPaused);
        let mut fields = Fields::new();
        fields.insert("stablecoin".into(), FieldValue::Pubkey(Default::default()));
        fields.insert("paused_by".into(), FieldValue::U64(1));
        fields.insert("timestamp".into(), FieldValue::I64(0));
        assert!(matches!(
            schema.encode(&fields),
            Err(CodecError::InvalidArgument { .. })
        ));
        fields.shift_remove("paused_by");
        assert!(schema.encode(&fields).is_err());
    }
}
