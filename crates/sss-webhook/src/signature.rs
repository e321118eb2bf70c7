//! Delivery signing.
//!
//! `X-SSS-Signature: sha256=<hex HMAC-SHA256(secret, body)>`, computed over
//! the exact request body bytes.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "X-SSS-Signature";
pub const EVENT_HEADER: &str = "X-SSS-Event";

const SCHEME: &str = "sha256=";

fn mac(secret: &[u8], body: &[u8]) -> HmacSha256 {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC key size is always valid");
    mac.update(body);
    mac
}

/// Header value for `body` signed with `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    format!("{SCHEME}{}", hex::encode(mac(secret, body).finalize().into_bytes()))
}

/// Constant-time check of a received signature header, for subscribers.
pub fn verify(secret: &[u8], body: &[u8], header: &str) -> bool {
    let Some(hex_sig) = header.strip_prefix(SCHEME) else {
        return false;
    };
    let Ok(sig) = hex::decode(hex_sig) else {
        return false;
    };
    mac(secret, body).verify_slice(&sig).is_ok()
}
