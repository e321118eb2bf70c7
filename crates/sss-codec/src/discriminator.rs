//! Anchor discriminator computation.
//!
//! The discriminator of an instruction or event is the first 8 bytes of
//! SHA-256 over its namespaced name, e.g.:
//!   sha256("global:initialize")[..8] → afaf6d1f0d989bed
//!   sha256("event:TokensMinted")[..8] → cfd480c2af364018

use crate::constants::{EVENT_NAMESPACE, INSTRUCTION_NAMESPACE};
use sha2::{Digest, Sha256};

pub type Discriminator = [u8; 8];

/// First 8 bytes of SHA-256(`"<namespace>:<name>"`).
pub fn sighash(namespace: &str, name: &str) -> Discriminator {
    let preimage = format!("{namespace}:{name}");
    let hash = Sha256::digest(preimage.as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&hash[..8]);
    out
}

/// Discriminator for an outbound instruction (snake_case name).
pub fn instruction_discriminator(name: &str) -> Discriminator {
    sighash(INSTRUCTION_NAMESPACE, name)
}

/// Discriminator for an emitted event (PascalCase name).
pub fn event_discriminator(name: &str) -> Discriminator {
    sighash(EVENT_NAMESPACE, name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchor_initialize_discriminator() {
        assert_eq!(hex::encode(instruction_discriminator("initialize")), "afaf6d1f0d989bed");
    }

    #[test]
    fn known_event_discriminators() {
        assert_eq!(
            event_discriminator("TokensMinted"),
            [207, 212, 128, 194, 175, 54, 64, 24]
        );
        assert_eq!(hex::encode(event_discriminator("TokensBurned")), "e6ff2271e235e309");
    }

    #[test]
    fn namespaces_differ() {
        assert_ne!(sighash("global", "pause"), sighash("event", "pause"));
    }

    #[test]
    fn deterministic() {
        assert_eq!(
            instruction_discriminator("mint_tokens"),
            instruction_discriminator("mint_tokens")
        );
        assert_eq!(hex::encode(instruction_discriminator("mint_tokens")), "3b8418f67a2708f3");
    }
}
