//! # sss-codec
//!
//! Wire-level codec for the SSS stablecoin program.
//!
//! The program is an Anchor program, so both directions share one layout:
//! - Instructions and events are prefixed with an 8-byte discriminator,
//!   the first 8 bytes of SHA-256(`"global:<name>"`) or SHA-256(`"event:<Name>"`).
//! - Payloads are Borsh-encoded in declaration order with no padding.
//! - Accounts owned by the program live at program-derived addresses.
//!
//! ## Architecture
//! ```text
//! outbound:  StablecoinInstruction ──► encode()  ──► discriminator ‖ borsh(args)
//!            seeds + program id    ──► find_program_address() ──► (address, bump)
//!
//! inbound:   "Program data: <b64>" ──► ProgramLogScanner ──► EventDecoder
//!                                                              │
//!                                              EventRegistry (discriminator → schema)
//! ```

pub mod constants;
pub mod decoder;
pub mod discriminator;
pub mod instruction;
pub mod logs;
pub mod pda;
pub mod registry;

pub use decoder::{DecodeOutcome, EventDecoder};
pub use discriminator::{event_discriminator, instruction_discriminator, Discriminator};
pub use instruction::{encode, ArgValue, StablecoinInstruction};
pub use logs::ProgramLogScanner;
pub use pda::{create_program_address, find_program_address};
pub use registry::{EventRegistry, EventSchema};
