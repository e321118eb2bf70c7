//! Event payload decoder.
//!
//! Input is the raw bytes carried by one `Program data:` log line:
//! `discriminator (8) ‖ borsh fields`. Unknown or truncated discriminators
//! are `Unrecognized`; a recognized event whose body is too short or
//! malformed is a `DecodeError`, never a partially filled record.

use crate::discriminator::Discriminator;
use crate::registry::{EventRegistry, EventSchema};
use sss_core::{DecodeError, EventKind, FieldKind, FieldValue, Fields, Pubkey};
use tracing::trace;

/// Result of looking at one candidate payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeOutcome {
    Decoded { kind: EventKind, fields: Fields },
    /// Not one of ours (or not an event at all); skip silently.
    Unrecognized,
}

/// Decodes event payloads against an [`EventRegistry`].
#[derive(Debug, Clone, Copy)]
pub struct EventDecoder {
    registry: &'static EventRegistry,
}

impl Default for EventDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDecoder {
    pub fn new() -> Self {
        Self {
            registry: EventRegistry::global(),
        }
    }

    pub fn decode(&self, payload: &[u8]) -> Result<DecodeOutcome, DecodeError> {
        if payload.len() < 8 {
            return Ok(DecodeOutcome::Unrecognized);
        }
        let mut disc: Discriminator = [0u8; 8];
        disc.copy_from_slice(&payload[..8]);

        let Some(schema) = self.registry.lookup(&disc) else {
            trace!(discriminator = %hex::encode(disc), "unrecognized event discriminator");
            return Ok(DecodeOutcome::Unrecognized);
        };

        let fields = decode_fields(&schema, &payload[8..])?;
        Ok(DecodeOutcome::Decoded {
            kind: schema.kind,
            fields,
        })
    }
}

fn decode_fields(schema: &EventSchema, body: &[u8]) -> Result<Fields, DecodeError> {
    let mut reader = Reader {
        buf: body,
        event: schema.name(),
    };
    let mut fields = Fields::with_capacity(schema.fields.len());
    for (name, kind) in schema.fields {
        let value = reader.read(name, *kind)?;
        fields.insert((*name).to_string(), value);
    }
    // Trailing bytes are ignored; only the known prefix is decoded.
    if !reader.buf.is_empty() {
        trace!(event = schema.name(), extra = reader.buf.len(), "trailing bytes after event");
    }
    Ok(fields)
}

struct Reader<'a> {
    buf: &'a [u8],
    event: &'static str,
}

impl<'a> Reader<'a> {
    fn take(&mut self, n: usize, field: &str, kind: FieldKind) -> Result<&'a [u8], DecodeError> {
        if self.buf.len() < n {
            return Err(DecodeError::BufferTooShort {
                event: self.event.into(),
                field: field.into(),
                kind: kind.to_string(),
            });
        }
        let (head, tail) = self.buf.split_at(n);
        self.buf = tail;
        Ok(head)
    }

    fn array<const N: usize>(&mut self, field: &str, kind: FieldKind) -> Result<[u8; N], DecodeError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N, field, kind)?);
        Ok(out)
    }

    fn read(&mut self, field: &str, kind: FieldKind) -> Result<FieldValue, DecodeError> {
        let value = match kind {
            FieldKind::Pubkey => FieldValue::Pubkey(Pubkey::new_from_array(self.array(field, kind)?)),
            FieldKind::U8 => FieldValue::U8(self.array::<1>(field, kind)?[0]),
            FieldKind::U64 => FieldValue::U64(u64::from_le_bytes(self.array(field, kind)?)),
            FieldKind::I64 => FieldValue::I64(i64::from_le_bytes(self.array(field, kind)?)),
            FieldKind::Bool => match self.array::<1>(field, kind)?[0] {
                0 => FieldValue::Bool(false),
                1 => FieldValue::Bool(true),
                byte => {
                    return Err(DecodeError::InvalidBool {
                        event: self.event.into(),
                        field: field.into(),
                        byte,
                    })
                }
            },
            FieldKind::Str => {
                let len = u32::from_le_bytes(self.array(field, kind)?) as usize;
                let bytes = self.take(len, field, kind)?;
                let s = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8 {
                    event: self.event.into(),
                    field: field.into(),
                })?;
                FieldValue::Str(s.to_string())
            }
        };
        Ok(value)
    }
}
