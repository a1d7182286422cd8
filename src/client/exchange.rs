//! # Exchange Patterns
//!
//! Composes [`Session`], the JSON [`envelope`] helpers and [`ImageCodec`]
//! into self-contained transactions. An [`Exchange`] holds configuration
//! only; nothing carries over from one call to the next.
//!
//! ## Failure Policy
//!
//! Inbound data degrades gracefully, outbound data fails loudly:
//!
//! | Exchange       | Bad payload / bad image        | Transport failure |
//! |----------------|--------------------------------|-------------------|
//! | pull image     | logged, `Ok(None)`             | `Err(Connection)` |
//! | pull fields    | error text in the first slot   | `Err(Connection)` |
//! | push image     | `Err(Encode)`                  | `Err(Connection)` |
//! | download image | `Err(Decode)`                  | `Err(..)`         |
//!
//! ## Usage
//!
//! ```rust,ignore
//! let exchange = Exchange::default();
//!
//! if let Some(image) = exchange.pull_image("ws://127.0.0.1:9001")? {
//!     let batch = image.into_batched(); // (1, H, W, 3)
//! }
//! ```

use base64::{engine::general_purpose, Engine as _};
use log::{error, info, warn};
use ndarray::ArrayViewD;
use serde_json::Value;

use crate::common::config::BridgeConfig;
use crate::common::connection::Session;
use crate::common::envelope::{self, IMAGE_KEY};
use crate::common::http::HttpFetcher;
use crate::error::Result;
use crate::processing::{ImageCodec, NormalizedImage};

/// Status returned by a successful push.
pub const PUSH_STATUS: &str = "Image sent successfully";

/// First-slot value of a field pull whose payload was not JSON.
pub const NON_JSON_MESSAGE: &str = "Error: Non-JSON message received";

/// Longest message excerpt written to the log.
const LOG_PREVIEW_CHARS: usize = 200;

/// Values of the three requested fields, in request order.
pub type FieldTriple = (Value, Value, Value);

/// Runs single-shot exchanges against WebSocket and HTTP endpoints.
#[derive(Default)]
pub struct Exchange {
    codec: ImageCodec,
    http: HttpFetcher,
}

impl Exchange {
    pub fn new(codec: ImageCodec, http: HttpFetcher) -> Self {
        Self { codec, http }
    }

    pub fn from_config(config: &BridgeConfig) -> Self {
        Self::new(
            ImageCodec::new(config.codec.jpeg_quality),
            HttpFetcher::new(config.http.timeout()),
        )
    }

    pub fn codec(&self) -> &ImageCodec {
        &self.codec
    }

    /// Receive one image envelope from `url`.
    ///
    /// # Returns
    /// - `Ok(Some(image))`: a decoded 3-channel image
    /// - `Ok(None)`: the message was not JSON, had no `"image"` key, or the
    ///   image could not be decoded (each case is logged)
    /// - `Err(Connection)`: connecting or receiving failed
    pub fn pull_image(&self, url: &str) -> Result<Option<NormalizedImage>> {
        let mut session = Session::open(url)?;
        let message = session.receive_one()?;
        session.close();

        Ok(self.image_from_message(&message))
    }

    /// Encode `tensor` as JPEG and send it to `url` inside an image envelope.
    ///
    /// Encoding happens before connecting, so a bad tensor never opens a
    /// session.
    ///
    /// # Errors
    /// - `Encode` when the tensor is not image-shaped
    /// - `Connection` when connecting or sending fails
    pub fn push_image(&self, url: &str, tensor: ArrayViewD<'_, f32>) -> Result<&'static str> {
        let jpeg = self.codec.encode(tensor)?;
        let payload = envelope::wrap(envelope::image_envelope(
            general_purpose::STANDARD.encode(&jpeg),
        ));

        let mut session = Session::open(url)?;
        session.send(payload)?;
        session.close();

        info!("📤 Sent {} byte JPEG to {}", jpeg.len(), url);
        Ok(PUSH_STATUS)
    }

    /// Receive one envelope from `url` and read three named fields.
    ///
    /// Missing fields read as `"N/A"`. A non-JSON payload yields
    /// `(NON_JSON_MESSAGE, "", "")`.
    pub fn pull_fields(&self, url: &str, names: [&str; 3]) -> Result<FieldTriple> {
        let mut session = Session::open(url)?;
        let message = session.receive_one()?;
        session.close();

        let fields = match envelope::unwrap(message.as_bytes()) {
            Ok(fields) => fields,
            Err(e) => {
                error!("❌ Received non-JSON message: {} ({})", preview(&message), e);
                return Ok((
                    Value::String(NON_JSON_MESSAGE.to_string()),
                    Value::String(String::new()),
                    Value::String(String::new()),
                ));
            }
        };

        let [first, second, third] = names;
        Ok((
            envelope::extract(&fields, first),
            envelope::extract(&fields, second),
            envelope::extract(&fields, third),
        ))
    }

    /// HTTP GET `url` and decode the body as an image.
    ///
    /// # Errors
    /// - `HttpStatus` on a non-success response
    /// - `Connection` when the endpoint is unreachable
    /// - `Decode` when the body is not an image
    pub fn download_image(&self, url: &str) -> Result<NormalizedImage> {
        let body = self.http.get_bytes(url)?;
        self.codec.decode(&body)
    }

    fn image_from_message(&self, message: &str) -> Option<NormalizedImage> {
        let fields = match envelope::unwrap(message.as_bytes()) {
            Ok(fields) => fields,
            Err(e) => {
                error!("❌ Received non-JSON message: {} ({})", preview(message), e);
                return None;
            }
        };

        let Some(value) = fields.get(IMAGE_KEY) else {
            warn!("⚠️  No image data found in the received message");
            return None;
        };

        let Some(encoded) = value.as_str() else {
            error!("❌ Error processing image data: \"image\" is not a string");
            return None;
        };

        let jpeg = match general_purpose::STANDARD.decode(envelope::base64_payload(encoded)) {
            Ok(bytes) => bytes,
            Err(e) => {
                error!("❌ Error processing image data: {}", e);
                return None;
            }
        };

        match self.codec.decode(&jpeg) {
            Ok(image) => {
                info!(
                    "📥 Received {}x{} image ({} bytes)",
                    image.width(),
                    image.height(),
                    jpeg.len()
                );
                Some(image)
            }
            Err(e) => {
                error!("❌ Error processing image data: {}", e);
                None
            }
        }
    }
}

fn preview(message: &str) -> String {
    if message.chars().count() <= LOG_PREVIEW_CHARS {
        message.to_string()
    } else {
        let head: String = message.chars().take(LOG_PREVIEW_CHARS).collect();
        format!("{}…", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{ArrayD, IxDyn};

    fn jpeg_base64(exchange: &Exchange) -> String {
        let tensor = ArrayD::<f32>::from_elem(IxDyn(&[12, 20, 3]), 0.4);
        general_purpose::STANDARD.encode(exchange.codec().encode(tensor.view()).unwrap())
    }

    #[test]
    fn test_image_from_data_uri_message() {
        let exchange = Exchange::default();
        let message = format!(
            r#"{{"image": "data:image/jpeg;base64,{}"}}"#,
            jpeg_base64(&exchange)
        );

        let image = exchange.image_from_message(&message).unwrap();
        assert_eq!((image.height(), image.width(), image.channels()), (12, 20, 3));
    }

    #[test]
    fn test_image_from_bare_base64_message() {
        let exchange = Exchange::default();
        let message = format!(r#"{{"image": "{}"}}"#, jpeg_base64(&exchange));
        assert!(exchange.image_from_message(&message).is_some());

        // MIME-style output wrapped at 76 characters
        let encoded = jpeg_base64(&exchange);
        let wrapped = encoded
            .as_bytes()
            .chunks(76)
            .map(|line| std::str::from_utf8(line).unwrap())
            .collect::<Vec<_>>()
            .join("\n");
        assert!(wrapped.contains('\n'));
        let message = serde_json::json!({ "image": wrapped }).to_string();
        assert!(exchange.image_from_message(&message).is_some());
    }

    #[test]
    fn test_image_from_bad_messages_is_none() {
        let exchange = Exchange::default();
        assert!(exchange.image_from_message("not valid json").is_none());
        assert!(exchange.image_from_message(r#"{"other": 1}"#).is_none());
        assert!(exchange.image_from_message(r#"{"image": 42}"#).is_none());
        assert!(exchange
            .image_from_message(r#"{"image": "data:image/jpeg;base64,!!!"}"#)
            .is_none());
        assert!(exchange
            .image_from_message(r#"{"image": "data:image/jpeg;base64,aGVsbG8="}"#)
            .is_none());
    }

    #[test]
    fn test_push_rejects_bad_tensor_before_connecting() {
        let exchange = Exchange::default();
        let tensor = ArrayD::<f32>::zeros(IxDyn(&[5]));

        // Nothing listens on this URL; the encode error must win.
        let err = exchange
            .push_image("ws://127.0.0.1:1", tensor.view())
            .unwrap_err();
        assert!(matches!(err, crate::error::BridgeError::Encode(_)));
    }

    #[test]
    fn test_preview_truncates_long_messages() {
        let long = "x".repeat(500);
        assert_eq!(preview(&long).chars().count(), LOG_PREVIEW_CHARS + 1);
        assert_eq!(preview("short"), "short");
    }
}
