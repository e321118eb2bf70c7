//! 32-byte Solana public key with base58 text form.

use crate::error::CodecError;
use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// A Solana account address.
#[derive(
    Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, BorshSerialize, BorshDeserialize,
)]
pub struct Pubkey([u8; 32]);

impl Pubkey {
    pub const LEN: usize = 32;

    pub const fn new_from_array(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Build from a slice; fails unless it is exactly 32 bytes long.
    pub fn try_from_slice(bytes: &[u8]) -> Result<Self, CodecError> {
        let arr: [u8; 32] = bytes.try_into().map_err(|_| CodecError::InvalidPubkey {
            input: format!("0x{}", hex::encode(&bytes[..bytes.len().min(8)])),
            reason: format!("expected 32 bytes, got {}", bytes.len()),
        })?;
        Ok(Self(arr))
    }

    pub fn to_bytes(self) -> [u8; 32] {
        self.0
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl AsRef<[u8]> for Pubkey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; 32]> for Pubkey {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Pubkey {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| CodecError::InvalidPubkey {
                input: s.to_string(),
                reason: e.to_string(),
            })?;
        if bytes.len() != Self::LEN {
            return Err(CodecError::InvalidPubkey {
                input: s.to_string(),
                reason: format!("decoded to {} bytes", bytes.len()),
            });
        }
        Self::try_from_slice(&bytes)
    }
}

impl fmt::Display for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Pubkey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pubkey({self})")
    }
}

impl Serialize for Pubkey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Pubkey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as Deserialize>::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base58_roundtrip() {
        let text = "2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ";
        let key: Pubkey = text.parse().unwrap();
        assert_eq!(key.to_string(), text);
    }

    #[test]
    fn system_program_is_all_zero() {
        let key: Pubkey = "11111111111111111111111111111111".parse().unwrap();
        assert_eq!(key, Pubkey::default());
    }

    #[test]
    fn rejects_wrong_length() {
        assert!("abc".parse::<Pubkey>().is_err());
        assert!(Pubkey::try_from_slice(&[1u8; 31]).is_err());
    }

    #[test]
    fn wrong_length_error_previews_leading_bytes() {
        let err = Pubkey::try_from_slice(&[0xab; 40]).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidPubkey { ref input, .. } if input == "0xabababababababab"
        ));
    }

    #[test]
    fn serde_as_string() {
        let key = Pubkey::new_from_array([7u8; 32]);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"US517G5965aydkZ46HS38QLi7UQiSojurfbQfKCELFx\"");
        let back: Pubkey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
    }
}
