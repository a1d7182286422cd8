//! # Error Taxonomy
//!
//! Every fallible operation in the bridge returns [`BridgeError`]. Whether a
//! variant is fatal depends on the exchange direction:
//!
//! - Pull exchanges swallow `MalformedPayload` and `Decode` (logged, no result)
//! - Push exchanges surface `Encode` to the caller
//! - `Connection` and `HttpStatus` always propagate

use thiserror::Error;

/// Errors produced by the codec, envelope, and transport layers.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Endpoint unreachable, handshake refused, or the peer dropped the link.
    #[error("connection error: {0}")]
    Connection(String),

    /// The received bytes were not a JSON object.
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// Bytes could not be interpreted as an image.
    #[error("failed to decode image: {0}")]
    Decode(String),

    /// An array could not be interpreted as image data, or JPEG encoding failed.
    #[error("failed to convert array to image: {0}")]
    Encode(String),

    /// HTTP endpoint answered with a non-success status.
    #[error("HTTP request failed with status {0}")]
    HttpStatus(u16),
}

impl From<tungstenite::Error> for BridgeError {
    fn from(err: tungstenite::Error) -> Self {
        BridgeError::Connection(err.to_string())
    }
}

impl From<serde_json::Error> for BridgeError {
    fn from(err: serde_json::Error) -> Self {
        BridgeError::MalformedPayload(err.to_string())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BridgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_errors_become_malformed_payload() {
        let err: BridgeError = serde_json::from_str::<serde_json::Value>("nope")
            .unwrap_err()
            .into();
        assert!(matches!(err, BridgeError::MalformedPayload(_)));
    }

    #[test]
    fn test_http_status_message() {
        assert_eq!(
            BridgeError::HttpStatus(404).to_string(),
            "HTTP request failed with status 404"
        );
    }
}
