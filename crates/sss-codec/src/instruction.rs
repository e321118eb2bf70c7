//! Instruction encoder.
//!
//! Produces `discriminator ‖ borsh(args…)` byte strings accepted by the
//! stablecoin program. `encode` is the generic entry point for any
//! operation name; `StablecoinInstruction` pins the argument order of the
//! operations the program actually exposes.
//!
//! # Usage
//! ```ignore
//! let data = StablecoinInstruction::MintTokens { amount: 1_000_000 }.data()?;
//! let same = encode("mint_tokens", &[ArgValue::U64(1_000_000)])?;
//! assert_eq!(data, same);
//! ```

use crate::discriminator::instruction_discriminator;
use borsh::BorshSerialize;
use sss_core::{CodecError, Pubkey};
use std::io::{self, Write};

/// A single typed instruction argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgValue {
    U8(u8),
    U64(u64),
    I64(i64),
    Bool(bool),
    /// u32 LE length ‖ UTF-8 bytes
    Str(String),
    Pubkey(Pubkey),
    /// u32 LE count ‖ 32-byte keys
    Pubkeys(Vec<Pubkey>),
    /// u32 LE length ‖ raw bytes
    Bytes(Vec<u8>),
    /// 0 = absent, 1 ‖ value = present
    Option(Option<Box<ArgValue>>),
}

impl BorshSerialize for ArgValue {
    fn serialize<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        match self {
            ArgValue::U8(v) => v.serialize(writer),
            ArgValue::U64(v) => v.serialize(writer),
            ArgValue::I64(v) => v.serialize(writer),
            ArgValue::Bool(v) => v.serialize(writer),
            ArgValue::Str(s) => s.serialize(writer),
            ArgValue::Pubkey(p) => p.serialize(writer),
            ArgValue::Pubkeys(keys) => keys.serialize(writer),
            ArgValue::Bytes(b) => b.serialize(writer),
            ArgValue::Option(inner) => inner.serialize(writer),
        }
    }
}

/// Encode an instruction: 8-byte `global:<name>` discriminator followed by
/// each argument in order.
pub fn encode(name: &str, args: &[ArgValue]) -> Result<Vec<u8>, CodecError> {
    if name.is_empty() || name.contains(':') {
        return Err(CodecError::UnknownOperation { name: name.into() });
    }
    let mut data = instruction_discriminator(name).to_vec();
    for arg in args {
        arg.serialize(&mut data)?;
    }
    Ok(data)
}

/// Every operation the stablecoin program exposes, with its arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StablecoinInstruction {
    Initialize {
        name: String,
        symbol: String,
        uri: String,
        decimals: u8,
        enable_permanent_delegate: bool,
        enable_transfer_hook: bool,
        default_account_frozen: bool,
    },
    MintTokens { amount: u64 },
    BurnTokens { amount: u64 },
    FreezeAccount,
    ThawAccount,
    Pause,
    Unpause,
    UpdateRoles {
        is_minter: bool,
        is_burner: bool,
        is_pauser: bool,
        is_blacklister: bool,
        is_seizer: bool,
    },
    UpdateMinter { quota: u64 },
    TransferAuthority,
    AddToBlacklist { reason: String },
    RemoveFromBlacklist,
    Seize,
}

impl StablecoinInstruction {
    /// Operation names accepted by [`StablecoinInstruction::parse`].
    pub const NAMES: [&'static str; 13] = [
        "initialize",
        "mint_tokens",
        "burn_tokens",
        "freeze_account",
        "thaw_account",
        "pause",
        "unpause",
        "update_roles",
        "update_minter",
        "transfer_authority",
        "add_to_blacklist",
        "remove_from_blacklist",
        "seize",
    ];

    /// The snake_case operation name hashed into the discriminator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initialize { .. } => "initialize",
            Self::MintTokens { .. } => "mint_tokens",
            Self::BurnTokens { .. } => "burn_tokens",
            Self::FreezeAccount => "freeze_account",
            Self::ThawAccount => "thaw_account",
            Self::Pause => "pause",
            Self::Unpause => "unpause",
            Self::UpdateRoles { .. } => "update_roles",
            Self::UpdateMinter { .. } => "update_minter",
            Self::TransferAuthority => "transfer_authority",
            Self::AddToBlacklist { .. } => "add_to_blacklist",
            Self::RemoveFromBlacklist => "remove_from_blacklist",
            Self::Seize => "seize",
        }
    }

    /// Arguments in wire order.
    pub fn args(&self) -> Vec<ArgValue> {
        match self {
            Self::Initialize {
                name,
                symbol,
                uri,
                decimals,
                enable_permanent_delegate,
                enable_transfer_hook,
                default_account_frozen,
            } => vec![
                ArgValue::Str(name.clone()),
                ArgValue::Str(symbol.clone()),
                ArgValue::Str(uri.clone()),
                ArgValue::U8(*decimals),
                ArgValue::Bool(*enable_permanent_delegate),
                ArgValue::Bool(*enable_transfer_hook),
                ArgValue::Bool(*default_account_frozen),
            ],
            Self::MintTokens { amount } | Self::BurnTokens { amount } => {
                vec![ArgValue::U64(*amount)]
            }
            Self::UpdateRoles {
                is_minter,
                is_burner,
                is_pauser,
                is_blacklister,
                is_seizer,
            } => [is_minter, is_burner, is_pauser, is_blacklister, is_seizer]
                .into_iter()
                .map(|b| ArgValue::Bool(*b))
                .collect(),
            Self::UpdateMinter { quota } => vec![ArgValue::U64(*quota)],
            Self::AddToBlacklist { reason } => vec![ArgValue::Str(reason.clone())],
            Self::FreezeAccount
            | Self::ThawAccount
            | Self::Pause
            | Self::Unpause
            | Self::TransferAuthority
            | Self::RemoveFromBlacklist
            | Self::Seize => Vec::new(),
        }
    }

    /// Full instruction data: discriminator followed by the encoded arguments.
    pub fn data(&self) -> Result<Vec<u8>, CodecError> {
        encode(self.name(), &self.args())
    }

    /// Build an instruction from its name and textual arguments.
    pub fn parse(name: &str, args: &[&str]) -> Result<Self, CodecError> {
        let expect = |n: usize| -> Result<(), CodecError> {
            if args.len() == n {
                Ok(())
            } else {
                Err(CodecError::InvalidArgument {
                    arg: name.into(),
                    reason: format!("expected {n} argument(s), got {}", args.len()),
                })
            }
        };

        let ix = match name {
            "initialize" => {
                expect(7)?;
                Self::Initialize {
                    name: args[0].into(),
                    symbol: args[1].into(),
                    uri: args[2].into(),
                    decimals: parse_num("decimals", args[3])?,
                    enable_permanent_delegate: parse_bool("enable_permanent_delegate", args[4])?,
                    enable_transfer_hook: parse_bool("enable_transfer_hook", args[5])?,
                    default_account_frozen: parse_bool("default_account_frozen", args[6])?,
                }
            }
            "mint_tokens" => {
                expect(1)?;
                Self::MintTokens { amount: parse_num("amount", args[0])? }
            }
            "burn_tokens" => {
                expect(1)?;
                Self::BurnTokens { amount: parse_num("amount", args[0])? }
            }
            "update_roles" => {
                expect(5)?;
                Self::UpdateRoles {
                    is_minter: parse_bool("is_minter", args[0])?,
                    is_burner: parse_bool("is_burner", args[1])?,
                    is_pauser: parse_bool("is_pauser", args[2])?,
                    is_blacklister: parse_bool("is_blacklister", args[3])?,
                    is_seizer: parse_bool("is_seizer", args[4])?,
                }
            }
            "update_minter" => {
                expect(1)?;
                Self::UpdateMinter { quota: parse_num("quota", args[0])? }
            }
            "add_to_blacklist" => {
                expect(1)?;
                Self::AddToBlacklist { reason: args[0].into() }
            }
            "freeze_account" | "thaw_account" | "pause" | "unpause" | "transfer_authority"
            | "remove_from_blacklist" | "seize" => {
                expect(0)?;
                match name {
                    "freeze_account" => Self::FreezeAccount,
                    "thaw_account" => Self::ThawAccount,
                    "pause" => Self::Pause,
                    "unpause" => Self::Unpause,
                    "transfer_authority" => Self::TransferAuthority,
                    "remove_from_blacklist" => Self::RemoveFromBlacklist,
                    _ => Self::Seize,
                }
            }
            other => return Err(CodecError::UnknownOperation { name: other.into() }),
        };
        Ok(ix)
    }
}

fn parse_num<T>(arg: &str, raw: &str) -> Result<T, CodecError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| CodecError::InvalidArgument {
        arg: arg.into(),
        reason: e.to_string(),
    })
}

fn parse_bool(arg: &str, raw: &str) -> Result<bool, CodecError> {
    match raw {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(CodecError::InvalidArgument {
            arg: arg.into(),
            reason: format!("expected true/false, got '{other}'"),
        }),
    }
}
