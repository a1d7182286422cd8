//! # HTTP Download
//!
//! Plain `GET url → response body` used by the download-image exchange.
//! Non-success status codes are errors, never empty bodies.

use std::io::Read;
use std::time::Duration;

use log::debug;

use crate::error::{BridgeError, Result};

/// Default cap on a downloaded body (100MB).
pub const MAX_BODY_SIZE: u64 = 100 * 1024 * 1024;

/// Blocking HTTP client for single downloads.
pub struct HttpFetcher {
    agent: ureq::Agent,
    /// Bodies longer than this are rejected, never truncated
    max_body_size: u64,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HttpFetcher {
    /// Create a fetcher. `timeout` bounds the whole request when given.
    pub fn new(timeout: Option<Duration>) -> Self {
        let mut builder = ureq::AgentBuilder::new();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Self {
            agent: builder.build(),
            max_body_size: MAX_BODY_SIZE,
        }
    }

    /// Replace the default body cap of [`MAX_BODY_SIZE`] bytes.
    pub fn with_max_body_size(mut self, bytes: u64) -> Self {
        self.max_body_size = bytes;
        self
    }

    /// Fetch `url` and return the raw response body.
    ///
    /// # Errors
    /// - `HttpStatus` for any non-2xx answer
    /// - `Connection` for DNS, connect, or I/O failures, and for bodies
    ///   larger than the configured cap
    pub fn get_bytes(&self, url: &str) -> Result<Vec<u8>> {
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(status, _)) => return Err(BridgeError::HttpStatus(status)),
            Err(e) => {
                return Err(BridgeError::Connection(format!(
                    "failed to download {}: {}",
                    url, e
                )))
            }
        };

        let status = response.status();
        if !(200..300).contains(&status) {
            return Err(BridgeError::HttpStatus(status));
        }

        // One byte past the cap is enough to tell an oversized body apart.
        let mut body = Vec::new();
        response
            .into_reader()
            .take(self.max_body_size.saturating_add(1))
            .read_to_end(&mut body)
            .map_err(|e| BridgeError::Connection(format!("failed to read body of {}: {}", url, e)))?;

        if body.len() as u64 > self.max_body_size {
            return Err(BridgeError::Connection(format!(
                "response body of {} exceeds {} bytes",
                url, self.max_body_size
            )));
        }

        debug!("📥 Downloaded {} bytes from {}", body.len(), url);
        Ok(body)
    }
}
