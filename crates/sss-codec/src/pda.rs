//! Program-derived address (PDA) derivation.
//!
//! A PDA is `sha256(seed_0 ‖ … ‖ seed_n ‖ program_id ‖ "ProgramDerivedAddress")`,
//! accepted only if the hash is *not* a valid compressed ed25519 point, so no
//! private key can exist for it. `find_program_address` appends a one-byte
//! bump seed and searches from 255 downward for the first off-curve result.

use crate::constants::*;
use curve25519_dalek::edwards::CompressedEdwardsY;
use sha2::{Digest, Sha256};
use sss_core::{CodecError, Pubkey};

/// Maximum number of seeds, including the bump.
pub const MAX_SEEDS: usize = 16;
/// Maximum length of a single seed in bytes.
pub const MAX_SEED_LEN: usize = 32;

const PDA_MARKER: &[u8] = b"ProgramDerivedAddress";

/// Returns `true` if `bytes` decompresses to a point on Curve25519.
pub fn is_on_curve(bytes: &[u8; 32]) -> bool {
    CompressedEdwardsY(*bytes).decompress().is_some()
}

/// Hash the seeds into a candidate address, failing if it lies on the curve.
pub fn create_program_address(seeds: &[&[u8]], program_id: &Pubkey) -> Result<Pubkey, CodecError> {
    if seeds.len() > MAX_SEEDS {
        return Err(CodecError::MaxSeedLengthExceeded {
            reason: format!("{} seeds, at most {MAX_SEEDS} allowed", seeds.len()),
        });
    }
    if let Some((i, seed)) = seeds.iter().enumerate().find(|(_, s)| s.len() > MAX_SEED_LEN) {
        return Err(CodecError::MaxSeedLengthExceeded {
            reason: format!("seed {i} is {} bytes, at most {MAX_SEED_LEN} allowed", seed.len()),
        });
    }

    let mut hasher = Sha256::new();
    for seed in seeds {
        hasher.update(seed);
    }
    hasher.update(program_id.as_ref());
    hasher.update(PDA_MARKER);
    let hash: [u8; 32] = hasher.finalize().into();

    if is_on_curve(&hash) {
        return Err(CodecError::OnCurve);
    }
    Ok(Pubkey::new_from_array(hash))
}

/// Find the canonical `(address, bump)` for `seeds` under `program_id`.
pub fn find_program_address(
    seeds: &[&[u8]],
    program_id: &Pubkey,
) -> Result<(Pubkey, u8), CodecError> {
    if seeds.len() >= MAX_SEEDS {
        return Err(CodecError::MaxSeedLengthExceeded {
            reason: format!("{} seeds leaves no room for the bump", seeds.len()),
        });
    }

    for bump in (0..=u8::MAX).rev() {
        let bump_seed = [bump];
        let mut with_bump: Vec<&[u8]> = seeds.to_vec();
        with_bump.push(&bump_seed);
        match create_program_address(&with_bump, program_id) {
            Ok(address) => return Ok((address, bump)),
            Err(CodecError::OnCurve) => {}
            Err(e) => return Err(e),
        }
    }

    Err(CodecError::NoViableBump {
        program: program_id.to_string(),
    })
}

/// Seed layouts for every account the stablecoin program owns.
///
/// Seed order matters: reordering produces a different (wrong) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdaDeriver {
    program_id: Pubkey,
}

impl Default for PdaDeriver {
    fn default() -> Self {
        Self::new(SSS_TOKEN_PROGRAM_ID)
    }
}

impl PdaDeriver {
    pub fn new(program_id: Pubkey) -> Self {
        Self { program_id }
    }

    pub fn program_id(&self) -> &Pubkey {
        &self.program_id
    }

    /// Primary stablecoin config: `["stablecoin", mint]`.
    pub fn stablecoin(&self, mint: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(&[STABLECOIN_SEED, mint.as_ref()], &self.program_id)
    }

    /// Per-holder role record: `["role", stablecoin, holder]`.
    pub fn role(&self, stablecoin: &Pubkey, holder: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(
            &[ROLE_SEED, stablecoin.as_ref(), holder.as_ref()],
            &self.program_id,
        )
    }

    /// Per-minter quota record: `["minter", stablecoin, minter]`.
    pub fn minter(&self, stablecoin: &Pubkey, minter: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(
            &[MINTER_SEED, stablecoin.as_ref(), minter.as_ref()],
            &self.program_id,
        )
    }

    /// Per-address denylist record: `["blacklist", stablecoin, address]`.
    pub fn blacklist(
        &self,
        stablecoin: &Pubkey,
        address: &Pubkey,
    ) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(
            &[BLACKLIST_SEED, stablecoin.as_ref(), address.as_ref()],
            &self.program_id,
        )
    }

    pub fn multisig(&self, stablecoin: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(&[MULTISIG_SEED, stablecoin.as_ref()], &self.program_id)
    }

    /// `["proposal", stablecoin, proposal_id as u64 LE]`
    pub fn proposal(&self, stablecoin: &Pubkey, proposal_id: u64) -> Result<(Pubkey, u8), CodecError> {
        let id = proposal_id.to_le_bytes();
        find_program_address(&[PROPOSAL_SEED, stablecoin.as_ref(), &id], &self.program_id)
    }

    pub fn timelock_config(&self, stablecoin: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(&[TIMELOCK_CONFIG_SEED, stablecoin.as_ref()], &self.program_id)
    }

    /// `["timelock", stablecoin, op_id as u64 LE]`
    pub fn timelock(&self, stablecoin: &Pubkey, op_id: u64) -> Result<(Pubkey, u8), CodecError> {
        let id = op_id.to_le_bytes();
        find_program_address(&[TIMELOCK_SEED, stablecoin.as_ref(), &id], &self.program_id)
    }

    pub fn transfer_limit(&self, stablecoin: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
        find_program_address(&[TRANSFER_LIMIT_SEED, stablecoin.as_ref()], &self.program_id)
    }
}

/// Transfer-hook validation account: `["extra-account-metas", mint]` under the hook program.
pub fn extra_account_metas(mint: &Pubkey, hook_program: &Pubkey) -> Result<(Pubkey, u8), CodecError> {
    find_program_address(&[EXTRA_ACCOUNT_METAS_SEED, mint.as_ref()], hook_program)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> Pubkey {
        s.parse().unwrap()
    }

    // Reference vectors from the Solana SDK's create_program_address tests.
    #[test]
    fn create_program_address_reference_vectors() {
        let program_id = key("BPFLoaderUpgradeab1e11111111111111111111111");
        let public_key = key("SeedPubey1111111111111111111111111111111111");

        assert_eq!(
            create_program_address(&[b"", &[1]], &program_id).unwrap(),
            key("BwqrghZA2htAcqq8dzP1WDAhTXYTYWj7CHxF5j7TDBAe")
        );
        assert_eq!(
            create_program_address(&["☉".as_bytes(), &[0]], &program_id).unwrap(),
            key("13yWmRpaTR4r5nAktwLqMpRNr28tnVUZw26rTvPSSB19")
        );
        assert_eq!(
            create_program_address(&[b"Talking", b"Squirrels"], &program_id).unwrap(),
            key("2fnQrngrQT4SeLcdToJAD96phoEjNL2man2kfRLCASVk")
        );
        assert_eq!(
            create_program_address(&[public_key.as_ref(), &[1]], &program_id).unwrap(),
            key("976ymqVnfE32QFe6NfGDctSvVa36LWnvYxhU6G2232YL")
        );
    }

    #[test]
    fn rejects_oversized_seed() {
        let program_id = Pubkey::default();
        let long = [0u8; MAX_SEED_LEN + 1];
        assert!(matches!(
            create_program_address(&[&long], &program_id),
            Err(CodecError::MaxSeedLengthExceeded { .. })
        ));
    }

    #[test]
    fn rejects_too_many_seeds() {
        let program_id = Pubkey::default();
        let seeds: Vec<&[u8]> = vec![b"a"; MAX_SEEDS];
        assert!(find_program_address(&seeds, &program_id).is_err());
    }

    #[test]
    fn find_is_deterministic_and_verifiable() {
        let mint = Pubkey::new_from_array([7u8; 32]);
        let pdas = PdaDeriver::default();
        let (a, bump_a) = pdas.stablecoin(&mint).unwrap();
        let (b, bump_b) = pdas.stablecoin(&mint).unwrap();
        assert_eq!((a, bump_a), (b, bump_b));

        let recreated =
            create_program_address(&[STABLECOIN_SEED, mint.as_ref(), &[bump_a]], pdas.program_id())
                .unwrap();
        assert_eq!(recreated, a);
        assert!(!is_on_curve(a.as_bytes()));
    }

    #[test]
    fn stablecoin_seed_layout() {
        let mint = Pubkey::new_from_array([7u8; 32]);
        let (address, bump) = PdaDeriver::default().stablecoin(&mint).unwrap();
        assert_eq!(address, key("AUbxLTQXJM7sPu9jNqEh3fJyxEFDfwYooTFk6ytumynb"));
        assert_eq!(bump, 253);
    }

    #[test]
    fn per_holder_seed_layouts() {
        let pdas = PdaDeriver::default();
        let stablecoin = key("AUbxLTQXJM7sPu9jNqEh3fJyxEFDfwYooTFk6ytumynb");
        let holder = Pubkey::new_from_array([9u8; 32]);

        assert_eq!(
            pdas.role(&stablecoin, &holder).unwrap(),
            (key("5L7ydBrqCEX7LNT5N8n4RKDroQWEBtYc5AdG2Y6aZbNf"), 248)
        );
        assert_eq!(
            pdas.minter(&stablecoin, &holder).unwrap(),
            (key("7BqkfeEWHWhGLyzQaFQmZt4NKixtkuBRRaYuxydr6LuS"), 255)
        );
        assert_eq!(
            pdas.blacklist(&stablecoin, &holder).unwrap(),
            (key("GiHQvZnrX8gte6Wmg92gwGEeZBr5fTa6BDWiGffr9ePS"), 253)
        );
    }

    #[test]
    fn seed_order_matters() {
        let pdas = PdaDeriver::default();
        let a = Pubkey::new_from_array([1u8; 32]);
        let b = Pubkey::new_from_array([2u8; 32]);
        assert_ne!(pdas.role(&a, &b).unwrap().0, pdas.role(&b, &a).unwrap().0);
    }

    #[test]
    fn hook_validation_account() {
        let mint = Pubkey::new_from_array([7u8; 32]);
        let (address, bump) = extra_account_metas(&mint, &SSS_TRANSFER_HOOK_PROGRAM_ID).unwrap();
        assert_eq!(address, key("AFDP8EhLhyamZTrqhi3H5qAHEZUbR62Sy7Z6J8jErYqs"));
        assert_eq!(bump, 252);
    }
}
