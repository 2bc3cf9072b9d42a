//! Freemius webhook signature verification
//!
//! Freemius signs the raw request body with HMAC-SHA256 and sends the
//! base64-encoded digest in a header. Verification MUST run against the raw,
//! pre-parsed body bytes: re-serializing parsed JSON produces a different
//! byte sequence and breaks verification silently.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Header names Freemius has used to carry the signature, in probe order.
/// The first non-empty match wins.
pub const SIGNATURE_HEADERS: [&str; 3] = [
    "x-freemius-signature",
    "x-fs-signature",
    "x-freemius-webhook-signature",
];

/// Verify a webhook signature against the raw request body.
///
/// Returns `false` (never errors) on missing secret, missing signature, or
/// any mismatch. Comparison is constant-time.
pub fn verify(raw_body: &[u8], provided_signature: &str, secret: &str) -> bool {
    if secret.is_empty() || provided_signature.is_empty() {
        return false;
    }

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(raw_body);
    let expected = BASE64.encode(mac.finalize().into_bytes());

    constant_time_eq(provided_signature.as_bytes(), expected.as_bytes())
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Compute the signature Freemius would send for a body. Test helper, but
/// also useful for replaying captured events against a local server.
pub fn sign(raw_body: &[u8], secret: &str) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(raw_body);
    Some(BASE64.encode(mac.finalize().into_bytes()))
}
