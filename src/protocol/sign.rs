//! Request signing.

use base64::{Engine as _, engine::general_purpose::STANDARD_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;

/// Header carrying the request signature.
pub const HMAC_HEADER: &str = "X-Ycm-Hmac";

type HmacSha256 = Hmac<Sha256>;

/// Computes the signature header value for a request body.
///
/// The HMAC-SHA256 tag over the exact body bytes is hex-encoded, and the
/// hex string itself is base64-encoded without padding. The server's
/// verifier expects exactly this double encoding; a single divergent byte
/// gets the request rejected.
pub fn signature(secret: &[u8], body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret).expect("HMAC accepts keys of any length");
    mac.update(body);
    STANDARD_NO_PAD.encode(hex_encode(&mac.finalize().into_bytes()))
}

/// Hex encoding helper.
fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_matches_reference_value() {
        // Reference computed with an independent HMAC-SHA256 implementation.
        let secret = [0x01u8; 16];
        let body = br#"{"a":1}"#;
        assert_eq!(
            signature(&secret, body),
            "MjQ5ZGI4YWQ5MmJmNTNjYjNkY2MxYjNmOTQ3YTc5NGFhNjI3ZTY5ZDM3YzQ1OTEzNGJlYmFiYThhODQ3MWEwOQ"
        );
    }

    #[test]
    fn test_signature_is_deterministic() {
        let secret = b"sixteen byte key";
        let body = b"payload";
        assert_eq!(signature(secret, body), signature(secret, body));
    }

    #[test]
    fn test_signature_changes_with_body() {
        let secret = [0x01u8; 16];
        assert_ne!(
            signature(&secret, br#"{"a":1}"#),
            signature(&secret, br#"{"a":2}"#)
        );
    }

    #[test]
    fn test_signature_changes_with_secret() {
        let body = br#"{"a":1}"#;
        assert_ne!(signature(&[0x01u8; 16], body), signature(&[0x02u8; 16], body));
    }

    #[test]
    fn test_signature_has_no_padding() {
        let value = signature(&[0x01u8; 16], b"");
        assert!(!value.ends_with('='));
        // A 64-char hex digest base64-encodes to 86 chars unpadded.
        assert_eq!(value.len(), 86);
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x0a]), "00ff0a");
    }
}
