use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::error;

type HmacSha256 = Hmac<Sha256>;

/// Header Linear puts the body signature in.
pub const SIGNATURE_HEADER: &str = "Linear-Signature";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureCheckResult {
    pub is_valid: bool,
    pub error: Option<String>,
}

impl SignatureCheckResult {
    fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    fn invalid(error: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(error.into()),
        }
    }
}

/// Checks a `Linear-Signature` header against the raw request body.
///
/// `raw_body` must be the bytes exactly as received. Re-serialized JSON does
/// not reproduce them reliably.
#[must_use]
pub fn check_signature(
    signature: &str,
    raw_body: &[u8],
    secret: Option<&str>,
) -> SignatureCheckResult {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return SignatureCheckResult::invalid("Missing secret token");
    };

    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return SignatureCheckResult::invalid(format!("Signature verification failed: {e}"));
        }
    };
    mac.update(raw_body);

    let Ok(expected) = hex::decode(signature) else {
        return SignatureCheckResult::invalid("Invalid signature");
    };

    // verify_slice compares in constant time
    match mac.verify_slice(&expected) {
        Ok(()) => SignatureCheckResult::valid(),
        Err(_) => SignatureCheckResult::invalid("Invalid signature"),
    }
}

/// Hex HMAC-SHA256 of `raw_body`, as Linear sends it.
#[must_use]
pub fn compute_signature(raw_body: &[u8], secret: &str) -> String {
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return String::new();
        }
    };
    mac.update(raw_body);
    hex::encode(mac.finalize().into_bytes())
}
