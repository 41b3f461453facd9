use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the hex HMAC-SHA256 of the callback body.
pub const SIGNATURE_HEADER: &str = "smartsheet-hmac-sha256";

/// Compute the hex signature Smartsheet sends for `body`.
#[cfg(test)]
pub fn compute_signature(secret: &str, body: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("any key length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

/// Verify a Smartsheet callback signature.
pub fn verify_signature(secret: &str, body: &[u8], signature_header: &str) -> bool {
    let expected = match hex::decode(signature_header.trim()) {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(body);
    mac.verify_slice(&expected).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_own_signature() {
        let body = br#"{"scope":"sheet","events":[]}"#;
        let sig = compute_signature("s3cr3t", body);
        assert!(verify_signature("s3cr3t", body, &sig));
        assert!(verify_signature("s3cr3t", body, &sig.to_uppercase()));
    }

    #[test]
    fn rejects_wrong_secret_or_body() {
        let body = br#"{"newWebHookStatus":"ENABLED"}"#;
        let sig = compute_signature("s3cr3t", body);
        assert!(!verify_signature("other", body, &sig));
        assert!(!verify_signature("s3cr3t", b"{}", &sig));
    }

    #[test]
    fn rejects_malformed_header() {
        assert!(!verify_signature("s3cr3t", b"{}", "not-hex"));
        assert!(!verify_signature("s3cr3t", b"{}", ""));
    }

    #[test]
    fn known_vector() {
        // RFC 4231 test case 2.
        assert_eq!(
            compute_signature("Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }
}
