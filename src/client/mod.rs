//! # Client Components
//!
//! The bridge only ever acts as a client: it opens a session, performs one
//! exchange, and closes it. [`exchange`] holds the four exchange patterns:
//!
//! - pull image: receive one `{"image": ...}` envelope and decode it
//! - push image: encode a tensor and send it as an envelope
//! - pull fields: receive one envelope and read three named fields
//! - download image: HTTP GET an image and decode it

pub mod exchange;

pub use exchange::{Exchange, FieldTriple, NON_JSON_MESSAGE, PUSH_STATUS};
