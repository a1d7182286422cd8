//! # Server Components
//!
//! The bridge never runs a long-lived server. [`peer`] provides the far end
//! of a single exchange for manual runs (`oxley-peer`) and tests.

pub mod peer;

pub use peer::{image_message, OneShotPeer};
