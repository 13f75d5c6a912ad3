//! Response builders for the webhook endpoint.
//!
//! Every response carries the same `{success, message, error}` body shape.

use serde_json::{Value, json};

use crate::errors::RelayError;

pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong.";
pub const SKIPPED_MESSAGE: &str = "Event skipped.";

fn response(status_code: u16, body: &Value) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": body.to_string()
    })
}

/// Returns a 200 OK response for a processed event.
#[must_use]
pub fn ok() -> Value {
    response(200, &json!({ "success": true, "message": "OK", "error": null }))
}

/// Returns a 200 OK response for an event that was deliberately ignored.
#[must_use]
pub fn skipped() -> Value {
    response(
        200,
        &json!({ "success": true, "message": SKIPPED_MESSAGE, "error": null }),
    )
}

/// Returns an error response with the given status code and error value.
#[must_use]
pub fn err_response(status_code: u16, error: Value) -> Value {
    response(
        status_code,
        &json!({ "success": false, "message": null, "error": error }),
    )
}

/// Maps a failure to its response.
///
/// Configuration errors expose their issue list; downstream failures are
/// reduced to a generic message.
#[must_use]
pub fn error_response(e: &RelayError) -> Value {
    let error = match e {
        RelayError::Config(config) => json!(config.issues),
        RelayError::Unauthorized(msg) | RelayError::MethodNotAllowed(msg) => json!(msg),
        RelayError::Validation(_) => json!(e.to_string()),
        RelayError::Tracker(_) | RelayError::Dispatch(_) | RelayError::Http(_) => {
            json!(GENERIC_ERROR_MESSAGE)
        }
    };
    err_response(e.status_code(), error)
}
