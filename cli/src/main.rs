//! `sss` — command-line interface for the SSS token indexer and codec.
//!
//! # Commands
//! ```text
//! sss run           [--config <indexer.yaml>]
//! sss pda           <kind> <args...> [--program <id>]
//! sss discriminator <event|instruction> <name>
//! sss decode        <base64 | "Program data: <base64>"> [--json]
//! sss encode        <operation> [args...]
//! ```

use anyhow::{anyhow, bail, Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand, ValueEnum};
use sss_codec::constants::{SSS_TOKEN_PROGRAM_ID, SSS_TRANSFER_HOOK_PROGRAM_ID};
use sss_codec::pda::{extra_account_metas, PdaDeriver};
use sss_codec::{
    event_discriminator, find_program_address, instruction_discriminator, DecodeOutcome,
    EventDecoder, StablecoinInstruction,
};
use sss_core::{EventKind, Pubkey};
use sss_indexer::{init_tracing, IndexerConfig, IndexerService};

#[derive(Parser)]
#[command(
    name = "sss",
    about = "SSS token toolkit: live event indexer, PDA derivation, instruction codec",
    long_about = "
SSS token toolkit.

ENVIRONMENT VARIABLES (override the config file):
  SSS_RPC_WS_URL     Solana WebSocket RPC endpoint
  SSS_PROGRAM_ID     Token program id (base58)
  SSS_DATABASE_URL   SQLite path or URL (unset = in-memory store)
  RUST_LOG           Log filter, overrides the config's log section
",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live indexer until Ctrl-C
    Run {
        /// Path to the YAML config file (defaults + env when omitted)
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Derive a program address
    Pda {
        #[command(subcommand)]
        kind: PdaKind,
        /// Owning program (default: the SSS token program)
        #[arg(long, global = true)]
        program: Option<String>,
    },

    /// Print the 8-byte discriminator for an event or instruction name
    Discriminator {
        #[arg(value_enum)]
        namespace: Namespace,
        /// Event name (e.g. TokensMinted) or instruction name (e.g. mint_tokens)
        name: String,
    },

    /// Decode a base64 event payload
    Decode {
        /// Base64 payload, or a full "Program data: ..." log line
        payload: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encode instruction data as hex
    Encode {
        /// Operation name, e.g. mint_tokens
        operation: String,
        /// Arguments in declaration order
        args: Vec<String>,
    },
}

#[derive(Subcommand)]
enum PdaKind {
    /// ["stablecoin", mint]
    Stablecoin { mint: String },
    /// ["role", stablecoin, holder]
    Role { stablecoin: String, holder: String },
    /// ["minter", stablecoin, minter]
    Minter { stablecoin: String, minter: String },
    /// ["blacklist", stablecoin, address]
    Blacklist { stablecoin: String, address: String },
    /// ["multisig", stablecoin]
    Multisig { stablecoin: String },
    /// ["proposal", stablecoin, id u64 LE]
    Proposal { stablecoin: String, id: u64 },
    /// ["timelock_config", stablecoin]
    TimelockConfig { stablecoin: String },
    /// ["timelock", stablecoin, id u64 LE]
    Timelock { stablecoin: String, id: u64 },
    /// ["transfer_limit", stablecoin]
    TransferLimit { stablecoin: String },
    /// ["extra-account-metas", mint] under the transfer-hook program
    ExtraAccountMetas { mint: String },
    /// Arbitrary seeds: str:<text>, key:<base58>, u64:<n>, hex:<bytes>
    Seeds { seeds: Vec<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Namespace {
    Event,
    Instruction,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config } => cmd_run(config.as_deref()).await,
        Commands::Pda { kind, program } => cmd_pda(kind, program.as_deref()),
        Commands::Discriminator { namespace, name } => cmd_discriminator(namespace, &name),
        Commands::Decode { payload, json } => cmd_decode(&payload, json),
        Commands::Encode { operation, args } => cmd_encode(&operation, &args),
    }
}

async fn cmd_run(config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => IndexerConfig::load(path).with_context(|| format!("load config '{path}'"))?,
        None => IndexerConfig::default().with_env(),
    };
    init_tracing(&config.log);

    let service = IndexerService::from_config(config)
        .await
        .context("initialise indexer")?;
    service.run().await?;
    Ok(())
}

fn pubkey(label: &str, s: &str) -> Result<Pubkey> {
    s.parse().with_context(|| format!("invalid {label} address"))
}

fn cmd_pda(kind: PdaKind, program: Option<&str>) -> Result<()> {
    let program_id = match program {
        Some(p) => pubkey("program", p)?,
        None => SSS_TOKEN_PROGRAM_ID,
    };
    let pda = PdaDeriver::new(program_id);

    let (address, bump) = match kind {
        PdaKind::Stablecoin { mint } => pda.stablecoin(&pubkey("mint", &mint)?)?,
        PdaKind::Role { stablecoin, holder } => {
            pda.role(&pubkey("stablecoin", &stablecoin)?, &pubkey("holder", &holder)?)?
        }
        PdaKind::Minter { stablecoin, minter } => {
            pda.minter(&pubkey("stablecoin", &stablecoin)?, &pubkey("minter", &minter)?)?
        }
        PdaKind::Blacklist { stablecoin, address } => {
            pda.blacklist(&pubkey("stablecoin", &stablecoin)?, &pubkey("address", &address)?)?
        }
        PdaKind::Multisig { stablecoin } => pda.multisig(&pubkey("stablecoin", &stablecoin)?)?,
        PdaKind::Proposal { stablecoin, id } => pda.proposal(&pubkey("stablecoin", &stablecoin)?, id)?,
        PdaKind::TimelockConfig { stablecoin } => {
            pda.timelock_config(&pubkey("stablecoin", &stablecoin)?)?
        }
        PdaKind::Timelock { stablecoin, id } => pda.timelock(&pubkey("stablecoin", &stablecoin)?, id)?,
        PdaKind::TransferLimit { stablecoin } => {
            pda.transfer_limit(&pubkey("stablecoin", &stablecoin)?)?
        }
        PdaKind::ExtraAccountMetas { mint } => {
            let hook = match program {
                Some(p) => pubkey("program", p)?,
                None => SSS_TRANSFER_HOOK_PROGRAM_ID,
            };
            extra_account_metas(&pubkey("mint", &mint)?, &hook)?
        }
        PdaKind::Seeds { seeds } => {
            let bytes = seeds.iter().map(|s| parse_seed(s)).collect::<Result<Vec<_>>>()?;
            let refs: Vec<&[u8]> = bytes.iter().map(Vec::as_slice).collect();
            find_program_address(&refs, &program_id)?
        }
    };

    println!("Address: {address}");
    println!("Bump:    {bump}");
    Ok(())
}

fn parse_seed(raw: &str) -> Result<Vec<u8>> {
    let (kind, value) = raw
        .split_once(':')
        .ok_or_else(|| anyhow!("seed '{raw}' must be <str|key|u64|hex>:<value>"))?;
    Ok(match kind {
        "str" => value.as_bytes().to_vec(),
        "key" => pubkey("seed", value)?.to_bytes().to_vec(),
        "u64" => value
            .parse::<u64>()
            .with_context(|| format!("invalid u64 seed '{value}'"))?
            .to_le_bytes()
            .to_vec(),
        "hex" => hex::decode(value.trim_start_matches("0x")).context("invalid hex seed")?,
        other => bail!("unknown seed kind '{other}'"),
    })
}

fn cmd_discriminator(namespace: Namespace, name: &str) -> Result<()> {
    let disc = match namespace {
        Namespace::Event => {
            if name.parse::<EventKind>().is_err() {
                eprintln!("warning: '{name}' is not a known SSS event");
            }
            event_discriminator(name)
        }
        Namespace::Instruction => {
            if !StablecoinInstruction::NAMES.contains(&name) {
                eprintln!("warning: '{name}' is not a known SSS instruction");
            }
            instruction_discriminator(name)
        }
    };
    println!("0x{}", hex::encode(disc));
    Ok(())
}

fn cmd_decode(payload: &str, as_json: bool) -> Result<()> {
    let encoded = payload
        .trim()
        .strip_prefix("Program data:")
        .unwrap_or(payload)
        .trim();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .context("invalid base64 payload")?;

    match EventDecoder::new().decode(&bytes)? {
        DecodeOutcome::Unrecognized => {
            let prefix = hex::encode(&bytes[..bytes.len().min(8)]);
            bail!("unrecognized event (discriminator 0x{prefix})");
        }
        DecodeOutcome::Decoded { kind, fields } => {
            if as_json {
                let out = serde_json::json!({ "event": kind.name(), "fields": fields });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                println!("Event:  {kind}");
                println!("Fields:");
                for (name, value) in &fields {
                    println!("  {name}: {value}");
                }
            }
        }
    }
    Ok(())
}

fn cmd_encode(operation: &str, args: &[String]) -> Result<()> {
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    let ix = StablecoinInstruction::parse(operation, &args)
        .with_context(|| format!("cannot build '{operation}'"))?;
    println!("0x{}", hex::encode(ix.data()?));
    Ok(())
}
