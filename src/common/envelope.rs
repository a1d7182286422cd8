//! # JSON Envelope
//!
//! Every exchange carries exactly one JSON object per message. Image
//! exchanges use a single key:
//!
//! ```text
//! {"image": "<optional-prefix>,<base64 JPEG>"}
//! ```
//!
//! Field exchanges look up arbitrary caller-named keys; absent keys read as
//! the literal string `"N/A"`.

use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// A decoded JSON object. Values stay tagged (`serde_json::Value`) so
/// strings, numbers, booleans, null and nested data survive untouched.
pub type Envelope = Map<String, Value>;

/// Key holding the Base64 image in image exchanges.
pub const IMAGE_KEY: &str = "image";

/// Value reported for a field the peer did not send.
pub const MISSING_FIELD: &str = "N/A";

/// Serialize an envelope to the text sent over the wire.
pub fn wrap(fields: Envelope) -> String {
    Value::Object(fields).to_string()
}

/// Parse a received payload.
///
/// # Errors
/// - `MalformedPayload` when the bytes are not JSON or not a JSON object.
///   Pull exchanges treat this as "no data".
pub fn unwrap(payload: &[u8]) -> Result<Envelope> {
    match serde_json::from_slice::<Value>(payload)? {
        Value::Object(fields) => Ok(fields),
        other => Err(BridgeError::MalformedPayload(format!(
            "expected a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Look up `key`, falling back to `"N/A"` when it is absent.
pub fn extract(fields: &Envelope, key: &str) -> Value {
    fields
        .get(key)
        .cloned()
        .unwrap_or_else(|| Value::String(MISSING_FIELD.to_string()))
}

/// Build the envelope for an outgoing Base64 image.
pub fn image_envelope(base64_jpeg: String) -> Envelope {
    let mut fields = Envelope::new();
    fields.insert(IMAGE_KEY.to_string(), Value::String(base64_jpeg));
    fields
}

/// Drop everything up to and including the first comma, such as a
/// `data:image/jpeg;base64` tag. Strings without a comma are returned as-is.
pub fn strip_data_uri(value: &str) -> &str {
    match value.split_once(',') {
        Some((_, payload)) => payload,
        None => value,
    }
}

/// Base64 text of an image value: the data-URI tag is stripped and ASCII
/// whitespace (such as MIME line wrapping) is removed.
pub fn base64_payload(value: &str) -> String {
    strip_data_uri(value)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
