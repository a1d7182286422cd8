//! # Node Adapters
//!
//! Host-facing wrappers around [`Exchange`]. A host pipeline discovers a
//! node through [`NodeAdapter`]: which inputs it takes, which outputs it
//! produces, and whether it must run again even when its inputs are
//! unchanged. Each adapter's `run` is a thin call into the exchange layer.
//!
//! Pull-style nodes read from the outside world, so their
//! [`NodeAdapter::should_reinvoke`] returns a fresh timestamp on every call.

use ndarray::{Array4, ArrayViewD};

use crate::client::{Exchange, FieldTriple};
use crate::error::Result;

/// Category every adapter is listed under.
pub const CATEGORY: &str = "oxley";

/// Type of value flowing through a node socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketKind {
    /// `(1, H, W, C)` normalized image tensor
    Image,
    String,
}

/// A named node input or output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Socket {
    pub name: &'static str,
    pub kind: SocketKind,
}

impl Socket {
    const fn new(name: &'static str, kind: SocketKind) -> Self {
        Self { name, kind }
    }
}

/// Capability interface a host uses to register a node.
pub trait NodeAdapter {
    /// Identifier the host registers the node under.
    fn name(&self) -> &'static str;

    fn category(&self) -> &'static str {
        CATEGORY
    }

    fn declare_inputs(&self) -> Vec<Socket>;

    fn declare_outputs(&self) -> Vec<Socket>;

    /// A value that differs between calls forces the host to re-execute.
    /// `None` lets the host cache on inputs alone.
    fn should_reinvoke(&self) -> Option<String>;
}

fn fresh_token() -> Option<String> {
    Some(chrono::Local::now().to_rfc3339())
}

/// Receives one image over WebSocket.
pub struct WebsocketDownloadImageNode;

impl WebsocketDownloadImageNode {
    /// `Ok(None)` when the peer sent nothing usable.
    pub fn run(&self, exchange: &Exchange, ws_url: &str) -> Result<Option<Array4<f32>>> {
        Ok(exchange.pull_image(ws_url)?.map(|image| image.into_batched()))
    }
}

impl NodeAdapter for WebsocketDownloadImageNode {
    fn name(&self) -> &'static str {
        "OxleyWebsocketDownloadImageNode"
    }

    fn declare_inputs(&self) -> Vec<Socket> {
        vec![Socket::new("ws_url", SocketKind::String)]
    }

    fn declare_outputs(&self) -> Vec<Socket> {
        vec![Socket::new("image_out", SocketKind::Image)]
    }

    fn should_reinvoke(&self) -> Option<String> {
        fresh_token()
    }
}

/// Sends one image over WebSocket.
pub struct WebsocketPushImageNode;

impl WebsocketPushImageNode {
    pub fn run(
        &self,
        exchange: &Exchange,
        image_in: ArrayViewD<'_, f32>,
        ws_url: &str,
    ) -> Result<String> {
        exchange
            .push_image(ws_url, image_in)
            .map(|status| status.to_string())
    }
}

impl NodeAdapter for WebsocketPushImageNode {
    fn name(&self) -> &'static str {
        "OxleyWebsocketPushImageNode"
    }

    fn declare_inputs(&self) -> Vec<Socket> {
        vec![
            Socket::new("image_in", SocketKind::Image),
            Socket::new("ws_url", SocketKind::String),
        ]
    }

    fn declare_outputs(&self) -> Vec<Socket> {
        vec![Socket::new("status_message", SocketKind::String)]
    }

    fn should_reinvoke(&self) -> Option<String> {
        None
    }
}

/// Receives one JSON message over WebSocket and reads three fields.
pub struct WebsocketReceiveJsonNode;

impl WebsocketReceiveJsonNode {
    pub fn run(
        &self,
        exchange: &Exchange,
        ws_url: &str,
        first_field_name: &str,
        second_field_name: &str,
        third_field_name: &str,
    ) -> Result<FieldTriple> {
        exchange.pull_fields(ws_url, [first_field_name, second_field_name, third_field_name])
    }
}

impl NodeAdapter for WebsocketReceiveJsonNode {
    fn name(&self) -> &'static str {
        "OxleyWebsocketReceiveJsonNode"
    }

    fn declare_inputs(&self) -> Vec<Socket> {
        vec![
            Socket::new("ws_url", SocketKind::String),
            Socket::new("first_field_name", SocketKind::String),
            Socket::new("second_field_name", SocketKind::String),
            Socket::new("third_field_name", SocketKind::String),
        ]
    }

    fn declare_outputs(&self) -> Vec<Socket> {
        vec![
            Socket::new("first_field_value", SocketKind::String),
            Socket::new("second_field_value", SocketKind::String),
            Socket::new("third_field_value", SocketKind::String),
        ]
    }

    fn should_reinvoke(&self) -> Option<String> {
        fresh_token()
    }
}

/// Downloads one image over HTTP.
pub struct DownloadImageNode;

impl DownloadImageNode {
    pub fn run(&self, exchange: &Exchange, url: &str) -> Result<Array4<f32>> {
        Ok(exchange.download_image(url)?.into_batched())
    }
}

impl NodeAdapter for DownloadImageNode {
    fn name(&self) -> &'static str {
        "OxleyDownloadImageNode"
    }

    fn declare_inputs(&self) -> Vec<Socket> {
        vec![Socket::new("url", SocketKind::String)]
    }

    fn declare_outputs(&self) -> Vec<Socket> {
        vec![Socket::new("image_out", SocketKind::Image)]
    }

    fn should_reinvoke(&self) -> Option<String> {
        fresh_token()
    }
}

/// Every adapter, in registration order.
pub fn registry() -> Vec<Box<dyn NodeAdapter>> {
    vec![
        Box::new(WebsocketDownloadImageNode),
        Box::new(WebsocketPushImageNode),
        Box::new(WebsocketReceiveJsonNode),
        Box::new(DownloadImageNode),
    ]
}
