//! Webhook signature verification: hex-encoded HMAC-SHA256 over the raw body.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Hex-encoded HMAC-SHA256 of `body` keyed by `secret`.
pub fn sign(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("hmac accepts any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a supplied hex signature against the body. Comparison is constant
/// time; any malformed or empty signature is a plain mismatch, never an error.
pub fn verify(secret: &[u8], body: &[u8], supplied: &str) -> bool {
    let supplied = supplied.trim();
    if supplied.is_empty() {
        return false;
    }
    let Ok(signature_bytes) = hex::decode(supplied) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_then_verify_round_trips() {
        let secret = b"channel-secret";
        let body = br#"{"events":[]}"#;
        let sig = sign(secret, body);
        assert!(verify(secret, body, &sig));
    }

    #[test]
    fn tampered_body_fails() {
        let secret = b"channel-secret";
        let sig = sign(secret, b"original");
        assert!(!verify(secret, b"originaL", &sig));
    }

    #[test]
    fn wrong_secret_fails() {
        let body = b"payload";
        let sig = sign(b"secret-a", body);
        assert!(!verify(b"secret-b", body, &sig));
    }

    #[test]
    fn empty_signature_fails() {
        assert!(!verify(b"secret", b"payload", ""));
        assert!(!verify(b"secret", b"payload", "   "));
    }

    #[test]
    fn non_hex_signature_fails() {
        assert!(!verify(b"secret", b"payload", "not hex at all"));
        // odd length
        assert!(!verify(b"secret", b"payload", "abc"));
    }
}
