//! Program log line recognition.
//!
//! The runtime writes one line per log call, e.g.
//! ```text
//! Program 2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ invoke [1]
//! Program log: Instruction: MintTokens
//! Program data: z9SAwq82QBgBAQEB...
//! Program 2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ consumed 21345 of 200000 compute units
//! Program 2D8s3bH6vD3LG7wqzvpSvYFysYoSK4wwggHCptaKFJJQ success
//! ```
//! Only `Program data:` lines carry events. The scanner follows the
//! invoke / success / failed lines so data emitted by *other* programs in
//! the same transaction (e.g. the token-2022 program during a CPI) is not
//! mistaken for ours.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sss_core::Pubkey;
use tracing::trace;

pub const PROGRAM_DATA_PREFIX: &str = "Program data: ";

/// Base64-decode the payload of a `Program data:` line.
///
/// Returns `None` for any other line and for invalid base64.
pub fn program_data(line: &str) -> Option<Vec<u8>> {
    let encoded = line.strip_prefix(PROGRAM_DATA_PREFIX)?.trim();
    match STANDARD.decode(encoded) {
        Ok(bytes) => Some(bytes),
        Err(e) => {
            trace!(error = %e, "ignoring program data line with invalid base64");
            None
        }
    }
}

/// Extracts event payloads emitted by one program from a transaction's logs.
#[derive(Debug, Clone)]
pub struct ProgramLogScanner {
    program_id: String,
}

impl ProgramLogScanner {
    pub fn new(program_id: &Pubkey) -> Self {
        Self {
            program_id: program_id.to_string(),
        }
    }

    pub fn program_id(&self) -> &str {
        &self.program_id
    }

    /// All event payloads emitted while our program was executing, in log order.
    ///
    /// Data lines are kept without an owner only when the logs contain no
    /// invoke line at all (truncated captures); the decoder rejects anything
    /// that is not one of our events.
    pub fn event_payloads<S: AsRef<str>>(&self, logs: &[S]) -> Vec<Vec<u8>> {
        let mut stack: Vec<&str> = Vec::new();
        let mut seen_invoke = false;
        let mut out = Vec::new();

        for line in logs {
            let line = line.as_ref();
            if line.starts_with(PROGRAM_DATA_PREFIX) {
                let ours = match stack.last() {
                    Some(top) => *top == self.program_id,
                    None => !seen_invoke,
                };
                if ours {
                    out.extend(program_data(line));
                }
                continue;
            }

            match runtime_line(line) {
                Some((program, RuntimeLine::Invoke)) => {
                    seen_invoke = true;
                    stack.push(program);
                }
                Some((_, RuntimeLine::Exit)) => {
                    stack.pop();
                }
                None => {}
            }
        }
        out
    }
}

enum RuntimeLine {
    Invoke,
    Exit,
}

/// Parse a runtime-written frame line:
/// `Program <id> invoke [<depth>]`, `Program <id> success` or
/// `Program <id> failed: <reason>`.
///
/// Program-written lines (`Program log:`, `Program return:`, ...) never
/// match because their second token is not an address.
fn runtime_line(line: &str) -> Option<(&str, RuntimeLine)> {
    let rest = line.strip_prefix("Program ")?;
    let (program, tail) = rest.split_once(' ')?;
    program.parse::<Pubkey>().ok()?;

    if let Some(depth) = tail.strip_prefix("invoke [").and_then(|t| t.strip_suffix(']')) {
        depth.parse::<u8>().ok()?;
        return Some((program, RuntimeLine::Invoke));
    }
    if tail == "success" || tail.starts_with("failed") {
        return Some((program, RuntimeLine::Exit));
    }
    None
}
