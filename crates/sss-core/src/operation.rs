//! Normalized "operation" projection of decoded events.
//!
//! Every event kind maps to exactly one operation shape. The mapping is a
//! pure function of `(kind, fields)` so the projection can always be
//! recomputed from a stored event row.

use crate::event::{EventKind, Fields};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome recorded for an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationStatus {
    /// Only successful transactions reach the projection.
    #[default]
    Success,
}

impl fmt::Display for OperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationStatus::Success => f.write_str("success"),
        }
    }
}

impl std::str::FromStr for OperationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "success" => Ok(OperationStatus::Success),
            other => Err(format!("unknown operation status '{other}'")),
        }
    }
}

/// A normalized view of what happened in one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// Operation name, e.g. `"mint"`, `"blacklist_add"`
    pub operation: String,
    /// Stablecoin record the operation pertains to
    pub subject: String,
    /// Address that performed the operation
    pub actor: String,
    /// Decimal-string amount, for value-moving operations
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    /// Secondary address the operation targeted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Transaction signature
    pub signature: String,
    pub status: OperationStatus,
}

/// Project a decoded event into its operation record.
///
/// Fields missing from the map project to empty strings / `None`, so the
/// function is total even over hand-built field maps.
pub fn project(kind: EventKind, fields: &Fields, signature: &str) -> OperationRecord {
    let (operation, actor, amount, target) = match kind {
        EventKind::StablecoinInitialized => ("initialize", "authority", None, Some("mint")),
        EventKind::TokensMinted => ("mint", "minter", Some("amount"), Some("recipient")),
        EventKind::TokensBurned => ("burn", "burner", Some("amount"), None),
        EventKind::AccountFrozen => ("freeze", "frozen_by", None, Some("account")),
        EventKind::AccountThawed => ("thaw", "thawed_by", None, Some("account")),
        EventKind::StablecoinPaused => ("pause", "paused_by", None, None),
        EventKind::StablecoinUnpaused => ("unpause", "unpaused_by", None, None),
        EventKind::RolesUpdated => ("update_roles", "updated_by", None, Some("holder")),
        EventKind::MinterUpdated => ("update_minter", "updated_by", Some("new_quota"), Some("minter")),
        EventKind::AuthorityTransferred => {
            ("transfer_authority", "previous_authority", None, Some("new_authority"))
        }
        EventKind::AddedToBlacklist => ("blacklist_add", "blacklisted_by", None, Some("address")),
        EventKind::RemovedFromBlacklist => ("blacklist_remove", "removed_by", None, Some("address")),
        EventKind::TokensSeized => ("seize", "seized_by", Some("amount"), Some("from")),
    };

    OperationRecord {
        operation: operation.to_string(),
        subject: text(fields, "stablecoin").unwrap_or_default(),
        actor: text(fields, actor).unwrap_or_default(),
        amount: amount.and_then(|f| text(fields, f)),
        target: target.and_then(|f| text(fields, f)),
        signature: signature.to_string(),
        status: OperationStatus::Success,
    }
}

fn text(fields: &Fields, name: &str) -> Option<String> {
    fields.get(name).map(|v| v.to_string())
}
