//! # Oxley Bridge
//!
//! Moves images and JSON fields between an in-process tensor pipeline and
//! remote endpoints reachable over WebSocket or HTTP.
//!
//! ## Modules
//!
//! - [`processing`]: normalized tensor ⇄ JPEG conversion
//! - [`common`]: JSON envelopes, transport sessions, HTTP download, configuration
//! - [`client`]: the exchange patterns (pull image, push image, pull fields, download)
//! - [`server`]: one-shot WebSocket peer used for manual runs and tests
//! - [`node`]: host-facing node adapters (input/output declarations, re-execution)

pub mod client;
pub mod common;
pub mod error;
pub mod node;
pub mod processing;
pub mod server;

pub use client::Exchange;
pub use error::{BridgeError, Result};
pub use processing::{ImageCodec, NormalizedImage};
