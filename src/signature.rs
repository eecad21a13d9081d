//! GitHub webhook signature verification

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

type HmacSha256 = Hmac<Sha256>;

/// Prefix GitHub puts in front of the hex digest in `X-Hub-Signature-256`.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Computes the `sha256=<hex>` header value GitHub would send for `payload`.
/// Returns None when the secret is empty.
pub fn compute_signature(payload: &[u8], secret: &str) -> Option<String> {
    if secret.is_empty() {
        return None;
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(payload);
    let digest = mac.finalize().into_bytes();

    Some(format!("{}{}", SIGNATURE_PREFIX, hex::encode(digest)))
}

/// Verifies a GitHub webhook signature against the raw request body.
///
/// `payload` must be the body exactly as received. Parsing and re-serializing
/// the JSON changes key order and whitespace, so the digest would not match.
///
/// Every failure (no secret, no header, length mismatch, digest mismatch)
/// collapses to `false`.
pub fn verify_github_signature(
    payload: &[u8],
    signature_header: Option<&str>,
    secret: Option<&str>,
) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        warn!("No webhook secret configured; rejecting request");
        return false;
    };

    let Some(signature_header) = signature_header else {
        debug!("No signature header supplied");
        return false;
    };

    let Some(expected) = compute_signature(payload, secret) else {
        return false;
    };

    if expected.len() != signature_header.len() {
        debug!(
            "Signature length mismatch: expected {}, got {}",
            expected.len(),
            signature_header.len()
        );
        return false;
    }

    // Constant-time comparison
    expected
        .as_bytes()
        .ct_eq(signature_header.as_bytes())
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "It's a Secret to Everybody";
    const BODY: &[u8] = b"Hello, World!";

    #[test]
    fn test_compute_signature_matches_github_reference() {
        // Reference vector from GitHub's webhook validation docs
        let signature = compute_signature(BODY, SECRET).unwrap();
        assert_eq!(
            signature,
            "sha256=757107ea0eb2509fc211221cce984b8a37570b6d7586c22c46f4379c8b043e17"
        );
    }

    #[test]
    fn test_verify_valid_signature() {
        let signature = compute_signature(BODY, SECRET).unwrap();
        assert!(verify_github_signature(BODY, Some(&signature), Some(SECRET)));
    }

    #[test]
    fn test_verify_uses_raw_bytes() {
        let raw = br#"{"ref": "refs/heads/main",  "commits": []}"#;
        let signature = compute_signature(raw, SECRET).unwrap();

        let reserialized =
            serde_json::to_vec(&serde_json::from_slice::<serde_json::Value>(raw).unwrap())
                .unwrap();
        assert!(verify_github_signature(raw, Some(&signature), Some(SECRET)));
        assert!(!verify_github_signature(
            &reserialized,
            Some(&signature),
            Some(SECRET)
        ));
    }

    #[test]
    fn test_verify_rejects_any_single_byte_mutation() {
        let body = br#"{"pusher":{"name":"octocat"},"ref":"refs/heads/main"}"#;
        let signature = compute_signature(body, SECRET).unwrap();

        for idx in 0..body.len() {
            let mut mutated = body.to_vec();
            mutated[idx] ^= 0x01;
            assert!(
                !verify_github_signature(&mutated, Some(&signature), Some(SECRET)),
                "mutation at byte {} was accepted",
                idx
            );
        }
    }

    #[test]
    fn test_verify_rejects_missing_or_empty_secret() {
        let signature = compute_signature(BODY, SECRET).unwrap();
        assert!(!verify_github_signature(BODY, Some(&signature), None));
        assert!(!verify_github_signature(BODY, Some(&signature), Some("")));
        assert!(compute_signature(BODY, "").is_none());
    }

    #[test]
    fn test_verify_rejects_missing_header() {
        assert!(!verify_github_signature(BODY, None, Some(SECRET)));
    }

    #[test]
    fn test_verify_rejects_malformed_headers() {
        let signature = compute_signature(BODY, SECRET).unwrap();
        let hex_only = signature.trim_start_matches(SIGNATURE_PREFIX);

        assert!(!verify_github_signature(BODY, Some(hex_only), Some(SECRET)));
        assert!(!verify_github_signature(BODY, Some("sha256="), Some(SECRET)));
        assert!(!verify_github_signature(BODY, Some(""), Some(SECRET)));
        assert!(!verify_github_signature(
            BODY,
            Some(&signature.to_uppercase()),
            Some(SECRET)
        ));
        assert!(!verify_github_signature(
            BODY,
            Some(&format!("{}00", signature)),
            Some(SECRET)
        ));
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let signature = compute_signature(BODY, "another secret").unwrap();
        assert!(!verify_github_signature(BODY, Some(&signature), Some(SECRET)));
    }
}
