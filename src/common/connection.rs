//! # Single-Shot WebSocket Session
//!
//! Wraps one client WebSocket for exactly one exchange:
//! ```text
//! open → send and/or receive one message → close
//! ```
//!
//! Every call blocks the calling thread. No timeout is applied to
//! [`Session::receive_one`]; callers needing bounded latency wrap the
//! exchange themselves.
//!
//! Closing is idempotent and also happens on drop, so early returns on
//! malformed input still release the socket.

use std::net::TcpStream;

use log::{debug, warn};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use crate::error::{BridgeError, Result};

type Socket = WebSocket<MaybeTlsStream<TcpStream>>;

/// One open connection to a WebSocket endpoint.
pub struct Session {
    /// Endpoint this session was opened against
    url: String,
    /// `None` once the session has been closed
    socket: Option<Socket>,
}

impl Session {
    /// Connect to `url` and complete the WebSocket handshake.
    ///
    /// # Arguments
    /// - `url`: `ws://host:port[/path]` endpoint of the peer
    ///
    /// # Errors
    /// - `Connection` on an invalid URL, refused connection, or failed handshake
    ///
    /// # Example
    /// ```ignore
    /// let mut session = Session::open("ws://127.0.0.1:9001")?;
    /// session.send(r#"{"image": "..."}"#.to_string())?;
    /// session.close();
    /// ```
    pub fn open(url: &str) -> Result<Self> {
        let (socket, _response) = tungstenite::connect(url)
            .map_err(|e| BridgeError::Connection(format!("failed to connect to {}: {}", url, e)))?;

        debug!("🔌 Connected to {}", url);

        Ok(Self {
            url: url.to_string(),
            socket: Some(socket),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_closed(&self) -> bool {
        self.socket.is_none()
    }

    /// Write one text message and flush it to the transport.
    ///
    /// # Arguments
    /// - `text`: Complete message body, sent as a single text frame
    ///
    /// # Errors
    /// - `Connection` if the session is already closed or the write fails
    pub fn send(&mut self, text: String) -> Result<()> {
        let socket = self.socket_mut()?;
        socket.send(Message::text(text))?;
        Ok(())
    }

    /// Block until one complete data message arrives.
    ///
    /// Binary frames are read as (lossy) UTF-8 text. Control frames are
    /// skipped.
    ///
    /// # Returns
    /// - `Ok(String)`: the first text or binary message
    /// - `Err(Connection)`: the peer closed or the link dropped first
    ///
    /// # Example
    /// ```ignore
    /// let mut session = Session::open(url)?;
    /// let message = session.receive_one()?;
    /// session.close();
    /// let fields = envelope::unwrap(message.as_bytes())?;
    /// ```
    pub fn receive_one(&mut self) -> Result<String> {
        let socket = self.socket_mut()?;

        loop {
            match socket.read()? {
                Message::Text(text) => return Ok(text.as_str().to_owned()),
                Message::Binary(bytes) => return Ok(String::from_utf8_lossy(&bytes).into_owned()),
                Message::Close(_) => {
                    return Err(BridgeError::Connection(
                        "peer closed the connection before sending a message".to_string(),
                    ))
                }
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => continue,
            }
        }
    }

    /// Send a close frame and release the socket. Safe to call repeatedly;
    /// only the first call touches the wire. Close errors are logged, never
    /// returned.
    pub fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            match socket.close(None) {
                Ok(()) | Err(tungstenite::Error::ConnectionClosed) => {}
                Err(tungstenite::Error::AlreadyClosed) => {}
                Err(e) => warn!("⚠️  Error while closing session to {}: {}", self.url, e),
            }
            let _ = socket.flush();
            debug!("🔒 Closed session to {}", self.url);
        }
    }

    fn socket_mut(&mut self) -> Result<&mut Socket> {
        self.socket
            .as_mut()
            .ok_or_else(|| BridgeError::Connection(format!("session to {} is already closed", self.url)))
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}
