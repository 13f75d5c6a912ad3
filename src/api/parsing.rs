use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use tracing::warn;

use crate::errors::RelayError;

/// The parts of an API Gateway proxy event the webhook handler reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundRequest {
    pub method: String,
    pub signature: String,
    pub forwarded_for: String,
    /// Body bytes exactly as delivered.
    pub body: Vec<u8>,
}

impl InboundRequest {
    /// Extracts method, headers and raw body from a REST (v1) or HTTP (v2)
    /// API Gateway event.
    ///
    /// # Errors
    ///
    /// Returns [`RelayError::Unauthorized`] when a base64 body does not decode,
    /// since no signature can match bytes that were never received.
    pub fn from_event(payload: &Value) -> Result<Self, RelayError> {
        let method = payload
            .get("httpMethod")
            .and_then(Value::as_str)
            .or_else(|| v_str(payload, &["requestContext", "http", "method"]))
            .unwrap_or_default()
            .to_ascii_uppercase();

        let headers = payload.get("headers").unwrap_or(&Value::Null);
        let header = |name: &str| get_header_value(headers, name).unwrap_or_default().to_string();

        let raw = payload.get("body").and_then(Value::as_str).unwrap_or_default();
        let is_base64 = payload
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = if is_base64 {
            STANDARD.decode(raw).map_err(|e| {
                warn!("Failed to decode base64 body: {}", e);
                RelayError::Unauthorized("Invalid signature".to_string())
            })?
        } else {
            raw.as_bytes().to_vec()
        };

        Ok(Self {
            method,
            signature: header(crate::api::signature::SIGNATURE_HEADER),
            forwarded_for: header("X-Forwarded-For"),
            body,
        })
    }
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}

pub fn get_header_value<'a>(headers: &'a Value, name: &str) -> Option<&'a str> {
    if let Some(v) = headers.get(name).and_then(|s| s.as_str()) {
        return Some(v);
    }
    headers.as_object().and_then(|map| {
        map.iter().find_map(|(k, v)| {
            if k.eq_ignore_ascii_case(name) {
                v.as_str()
            } else {
                None
            }
        })
    })
}
