//! # One-Shot Peer
//!
//! The far end of a single exchange: bind, accept one WebSocket client, then
//! send one message, receive one message, or hang up. Backs the `oxley-peer`
//! binary and the exchange test suites.

use std::net::{SocketAddr, TcpListener, TcpStream};
use std::time::Duration;

use base64::{engine::general_purpose, Engine as _};
use log::{debug, info, warn};
use tungstenite::{Message, WebSocket};

use crate::common::envelope;
use crate::error::{BridgeError, Result};

/// How long to wait for the client's close frame after the exchange.
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// A listener that serves exactly one WebSocket client.
pub struct OneShotPeer {
    listener: TcpListener,
    addr: SocketAddr,
}

impl OneShotPeer {
    /// Bind a listener for one client.
    ///
    /// # Arguments
    /// - `addr`: Socket address to listen on; port 0 picks an ephemeral port
    ///
    /// # Example
    /// ```ignore
    /// let peer = OneShotPeer::bind("127.0.0.1:0")?;
    /// println!("clients connect to {}", peer.url());
    /// ```
    pub fn bind(addr: &str) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .map_err(|e| BridgeError::Connection(format!("failed to bind {}: {}", addr, e)))?;
        let addr = listener
            .local_addr()
            .map_err(|e| BridgeError::Connection(e.to_string()))?;
        Ok(Self { listener, addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// `ws://` URL clients should connect to, with the port actually bound.
    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Accept one client, send `payload` as a text message, and wait for the
    /// client to close.
    ///
    /// # Returns
    /// - `Ok(true)`: the client answered with a close frame
    /// - `Ok(false)`: the link dropped or went quiet for the close grace
    ///   period without a close frame
    /// - `Err`: accept, handshake, or send failed
    ///
    /// # Example
    /// ```ignore
    /// let peer = OneShotPeer::bind("127.0.0.1:0")?;
    /// let url = peer.url();
    /// let handle = thread::spawn(move || peer.send_one(r#"{"a": 1}"#.to_string()));
    ///
    /// exchange.pull_fields(&url, ["a", "b", "c"])?;
    /// assert!(handle.join().unwrap()?);
    /// ```
    pub fn send_one(self, payload: String) -> Result<bool> {
        let mut ws = self.accept()?;
        let len = payload.len();
        ws.send(Message::text(payload))?;
        info!("📤 Sent {} byte message to client", len);
        Ok(drain_until_closed(&mut ws))
    }

    /// Accept one client and return the first data message it sends.
    ///
    /// Binary frames are read as (lossy) UTF-8.
    ///
    /// # Errors
    /// - `Connection` if the client closes before sending anything
    pub fn receive_one(self) -> Result<String> {
        let mut ws = self.accept()?;

        let text = loop {
            match ws.read()? {
                Message::Text(text) => break text.as_str().to_owned(),
                Message::Binary(bytes) => break String::from_utf8_lossy(&bytes).into_owned(),
                Message::Close(_) => {
                    return Err(BridgeError::Connection(
                        "client closed the connection before sending a message".to_string(),
                    ))
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        };

        info!("📥 Received {} byte message from client", text.len());
        if !drain_until_closed(&mut ws) {
            warn!("⚠️  Client left without a close frame");
        }
        Ok(text)
    }

    /// Accept one client and close without sending anything.
    pub fn hang_up(self) -> Result<()> {
        let mut ws = self.accept()?;
        ws.close(None)?;
        drain_until_closed(&mut ws);
        Ok(())
    }

    fn accept(&self) -> Result<WebSocket<TcpStream>> {
        info!("👂 Waiting for one client on {}", self.url());
        let (stream, remote) = self
            .listener
            .accept()
            .map_err(|e| BridgeError::Connection(format!("accept failed: {}", e)))?;
        stream
            .set_read_timeout(Some(CLOSE_GRACE))
            .map_err(|e| BridgeError::Connection(e.to_string()))?;

        let ws = tungstenite::accept(stream)
            .map_err(|e| BridgeError::Connection(format!("handshake with {} failed: {}", remote, e)))?;
        debug!("🔌 Client {} connected", remote);
        Ok(ws)
    }
}

/// Build an image envelope around `jpeg`, optionally behind a data-URI tag.
pub fn image_message(jpeg: &[u8], data_uri: bool) -> String {
    let encoded = general_purpose::STANDARD.encode(jpeg);
    let value = if data_uri {
        format!("data:image/jpeg;base64,{}", encoded)
    } else {
        encoded
    };
    envelope::wrap(envelope::image_envelope(value))
}

/// Read until the link ends. Returns whether a close frame from the client
/// was seen on the way.
fn drain_until_closed(ws: &mut WebSocket<TcpStream>) -> bool {
    let mut closed_by_client = false;
    loop {
        match ws.read() {
            Ok(Message::Close(_)) => closed_by_client = true,
            Ok(_) => {}
            Err(_) => return closed_by_client,
        }
    }
}
