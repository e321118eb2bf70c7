//! Program identifiers and PDA seed prefixes.

use sss_core::Pubkey;

/// `2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ`
pub const SSS_TOKEN_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    17, 247, 140, 19, 183, 128, 54, 140, 167, 253, 13, 141, 157, 129, 37, 58, 86, 143, 4, 63,
    216, 162, 100, 105, 8, 151, 153, 169, 185, 253, 17, 133,
]);

/// `F2of7agMFET8v3verXe3e6Hmfd71t833RjPxEjs5wRdd`
pub const SSS_TRANSFER_HOOK_PROGRAM_ID: Pubkey = Pubkey::new_from_array([
    208, 121, 244, 2, 100, 183, 155, 35, 159, 214, 45, 217, 114, 213, 135, 140, 67, 178, 228, 42,
    158, 254, 35, 54, 146, 207, 8, 220, 68, 152, 127, 156,
]);

pub const STABLECOIN_SEED: &[u8] = b"stablecoin";
pub const ROLE_SEED: &[u8] = b"role";
pub const MINTER_SEED: &[u8] = b"minter";
pub const BLACKLIST_SEED: &[u8] = b"blacklist";
pub const MULTISIG_SEED: &[u8] = b"multisig";
pub const PROPOSAL_SEED: &[u8] = b"proposal";
pub const TIMELOCK_CONFIG_SEED: &[u8] = b"timelock_config";
pub const TIMELOCK_SEED: &[u8] = b"timelock";
pub const TRANSFER_LIMIT_SEED: &[u8] = b"transfer_limit";
pub const EXTRA_ACCOUNT_METAS_SEED: &[u8] = b"extra-account-metas";

/// Namespace hashed into instruction discriminators.
pub const INSTRUCTION_NAMESPACE: &str = "global";
/// Namespace hashed into event discriminators.
pub const EVENT_NAMESPACE: &str = "event";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_ids_match_base58() {
        assert_eq!(
            SSS_TOKEN_PROGRAM_ID.to_string(),
            "2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ"
        );
        assert_eq!(
            SSS_TRANSFER_HOOK_PROGRAM_ID.to_string(),
            "F2of7agMFET8v3verXe3e6Hmfd71t833RjPxEjs5wRdd"
        );
    }
}
