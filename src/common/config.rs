//! # Configuration Utilities
//!
//! TOML configuration shared by the `oxley-bridge` and `oxley-peer` binaries.
//! Every section has defaults, so an empty file (or no file) is valid.
//!
//! ```toml
//! [codec]
//! jpeg_quality = 90
//!
//! [http]
//! timeout_secs = 30
//!
//! [logging]
//! level = "debug"
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::Result;
use log::LevelFilter;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::processing::DEFAULT_JPEG_QUALITY;

/// Load a TOML configuration file and deserialize it into the specified type.
///
/// # Example
/// ```ignore
/// let config: BridgeConfig = load_config("config/bridge.toml")?;
/// ```
pub fn load_config<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Top-level bridge configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub codec: CodecConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
}

impl BridgeConfig {
    /// Load from `path`, or fall back to defaults when no path is given.
    pub fn from_optional_file(path: Option<&str>) -> Result<Self> {
        match path {
            Some(path) => load_config(path),
            None => Ok(Self::default()),
        }
    }
}

/// Outgoing JPEG settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// JPEG quality, 1 (smallest) to 100 (best)
    pub jpeg_quality: u8,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

/// HTTP download settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Overall request timeout; unbounded when absent
    pub timeout_secs: Option<u64>,
}

impl HttpConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Log output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// One of `off`, `error`, `warn`, `info`, `debug`, `trace`
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed filter; unknown names fall back to `Info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::Info)
    }
}
