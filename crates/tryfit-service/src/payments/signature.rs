//! Webhook signature verification.
//!
//! Payment webhooks carry a hex-encoded HMAC-SHA256 of the raw request
//! body. Verification runs over the exact bytes received, before any
//! JSON parsing.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex-encoded HMAC-SHA256 of the request body.
pub const SIGNATURE_HEADER: &str = "x-payment-signature";

/// Compute the hex-encoded HMAC-SHA256 signature for a payload.
///
/// # Panics
///
/// This function will never panic in practice. The `expect` call is guarded by
/// the invariant that HMAC-SHA256 accepts keys of any size per RFC 2104.
#[must_use]
pub fn sign(secret: &str, payload: &str) -> String {
    // INVARIANT: HMAC-SHA256 accepts keys of any size per RFC 2104, so
    // `new_from_slice` only fails if the Hmac implementation is broken.
    // This is a library invariant, not a runtime condition.
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts any key size");
    mac.update(payload.as_bytes());
    let result = mac.finalize();

    hex::encode(result.into_bytes())
}

/// Verify a provided signature against the payload.
///
/// The provided value is trimmed and lowercased before comparison, so
/// uppercase hex from the sender still verifies. The comparison itself is
/// constant-time.
#[must_use]
pub fn verify(secret: &str, payload: &str, provided: &str) -> bool {
    let expected = sign(secret, payload);
    let provided = provided.trim().to_ascii_lowercase();
    constant_time_eq(&expected, &provided)
}

/// Constant-time string comparison to prevent timing attacks.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}
