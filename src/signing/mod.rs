//! Canonical payload serialization and HMAC-SHA256 signing (spec §4.3
//! step 3). The same bytes produced here are what goes out as the request
//! body — signature and body must never be computed from two different
//! serializations.
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::errors::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Canonical JSON bytes for a payload: exactly what `serde_json`'s
/// default compact serializer emits, UTF-8, no added whitespace.
pub fn canonical_body(payload: &serde_json::Value) -> Result<Vec<u8>, AppError> {
    serde_json::to_vec(payload).map_err(|e| AppError::MalformedPayload(e.to_string()))
}

/// Lowercase hex HMAC-SHA256 of `body` under `secret`.
pub fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts a key of any length");
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn canonical_body_is_compact_utf8() {
        let body = canonical_body(&json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(body, br#"{"a":1,"b":2}"#);
    }

    #[test]
    fn signature_matches_independent_computation() {
        let body = canonical_body(&json!({"a": 1})).unwrap();
        let sig = sign("secret-123", &body);

        let mut mac = HmacSha256::new_from_slice(b"secret-123").unwrap();
        mac.update(&body);
        let expected = hex::encode(mac.finalize().into_bytes());

        assert_eq!(sig, expected);
    }

    #[test]
    fn signature_is_deterministic() {
        let body = canonical_body(&json!({"x": [1, 2, 3]})).unwrap();
        assert_eq!(sign("s", &body), sign("s", &body));
    }

    #[test]
    fn different_secrets_yield_different_signatures() {
        let body = canonical_body(&json!({"x": 1})).unwrap();
        assert_ne!(sign("secret-a", &body), sign("secret-b", &body));
    }
}
