//! HMAC-SHA256 signing and timing-safe verification (spec §4.6).
//!
//! The constant-time comparison XOR-accumulates over equal-length byte
//! strings, short-circuiting only on the length check (never on content).

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes and verifies HMAC-SHA256 signatures over canonical payload bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Signer;

impl Signer {
    /// Compute a lowercase hex-encoded HMAC-SHA256 digest over `payload_bytes`.
    pub fn sign(payload_bytes: &[u8], secret: &str) -> String {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
            .expect("HMAC accepts a key of any length");
        mac.update(payload_bytes);
        hex::encode(mac.finalize().into_bytes())
    }

    /// Verify `signature_hex` against the HMAC-SHA256 digest of `payload_bytes`
    /// computed with `secret`, using a constant-time comparison.
    pub fn verify(payload_bytes: &[u8], signature_hex: &str, secret: &str) -> bool {
        let expected = Self::sign(payload_bytes, secret);
        constant_time_eq(expected.as_bytes(), signature_hex.as_bytes())
    }

    /// Format the `X-Signature` header value: `sha256=<hex>`.
    pub fn header_value(payload_bytes: &[u8], secret: &str) -> String {
        format!("sha256={}", Self::sign(payload_bytes, secret))
    }

    /// Parse an `X-Signature` header value, rejecting anything that does not
    /// match `^sha256=[a-f0-9]+$`.
    pub fn parse_header(value: &str) -> Option<&str> {
        let hex_part = value.strip_prefix("sha256=")?;
        if hex_part.is_empty() || !hex_part.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()) {
            return None;
        }
        Some(hex_part)
    }
}

/// Constant-time byte comparison. Always returns `false` on length mismatch
/// without comparing content, then XOR-accumulates across every byte so the
/// comparison takes the same time regardless of where the first difference
/// falls.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

#[cfg(test)]
#[path = "signer_tests.rs"]
mod tests;
