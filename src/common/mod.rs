//! # Common Components
//!
//! Shared building blocks for the exchange patterns and the one-shot peer.
//!
//! ## Modules
//!
//! - [`envelope`]: JSON framing of images and named fields
//! - [`connection`]: single-shot WebSocket session with guaranteed closure
//! - [`http`]: plain HTTP GET download
//! - [`config`]: TOML configuration loading
//! - [`logging`]: `env_logger` setup shared by the binaries

pub mod config;
pub mod connection;
pub mod envelope;
pub mod http;
pub mod logging;
