//! Webhook signature verification

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Verify a GitHub-style `X-Hub-Signature-256` header value against the raw
/// request body: `sha256=` followed by the hex HMAC-SHA256 digest of the
/// body under the shared secret.
pub fn verify(secret: &str, body: &[u8], header: &str) -> Result<()> {
    let digest = header
        .strip_prefix("sha256=")
        .ok_or_else(|| Error::Signature("signature header must start with sha256=".to_string()))?;
    let expected = hex::decode(digest)
        .map_err(|_| Error::Signature("signature is not valid hex".to_string()))?;

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Error::Signature(format!("invalid webhook secret: {}", e)))?;
    mac.update(body);
    mac.verify_slice(&expected)
        .map_err(|_| Error::Signature("signature mismatch".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(secret: &str, body: &[u8]) -> String {
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(body);
        format!("sha256={}", hex::encode(mac.finalize().into_bytes()))
    }

    #[test]
    fn test_valid_signature_passes() {
        let body = br#"{"ref": "refs/heads/main"}"#;
        let header = sign("s3cret", body);
        assert!(verify("s3cret", body, &header).is_ok());
    }

    #[test]
    fn test_wrong_secret_fails() {
        let body = br#"{"ref": "refs/heads/main"}"#;
        let header = sign("other", body);
        assert!(matches!(
            verify("s3cret", body, &header),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_tampered_body_fails() {
        let header = sign("s3cret", br#"{"ref": "refs/heads/main"}"#);
        assert!(matches!(
            verify("s3cret", br#"{"ref": "refs/heads/dev"}"#, &header),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_missing_prefix_fails() {
        assert!(matches!(
            verify("s3cret", b"body", "deadbeef"),
            Err(Error::Signature(_))
        ));
    }

    #[test]
    fn test_non_hex_digest_fails() {
        assert!(matches!(
            verify("s3cret", b"body", "sha256=not-hex"),
            Err(Error::Signature(_))
        ));
    }
}
