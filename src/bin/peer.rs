//! # Peer Binary Entry Point
//!
//! Serves exactly one WebSocket client, for trying the bridge by hand.
//!
//! ## Usage
//!
//! ```bash
//! # Hand one image to the next `oxley-bridge pull-image`
//! oxley-peer --bind 127.0.0.1:9001 send-image --input photo.jpg --data-uri
//!
//! # Hand one JSON object to the next `oxley-bridge pull-fields`
//! oxley-peer --bind 127.0.0.1:9001 send-json '{"prompt": "a cat", "seed": 7}'
//!
//! # Catch the next `oxley-bridge push-image` and save the JPEG
//! oxley-peer --bind 127.0.0.1:9001 receive --output pushed.jpg
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};
use clap::{Parser, Subcommand};
use log::{info, warn};

use oxley_bridge::common::config::BridgeConfig;
use oxley_bridge::common::envelope::{self, IMAGE_KEY};
use oxley_bridge::common::logging::init_logger;
use oxley_bridge::server::{image_message, OneShotPeer};

/// Command-line arguments for the peer binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:9001")]
    bind: String,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Send an image file (as-is, Base64 in an envelope) to one client
    SendImage {
        #[arg(short, long)]
        input: PathBuf,
        /// Prefix the payload with `data:image/jpeg;base64,`
        #[arg(long)]
        data_uri: bool,
    },
    /// Send a raw text message (JSON or not) to one client
    SendJson { payload: String },
    /// Receive one message; save its image if it carries one
    Receive {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = BridgeConfig::from_optional_file(args.config.as_deref())?;
    init_logger(config.logging.level_filter());

    let peer = OneShotPeer::bind(&args.bind)?;
    info!("🚀 Peer listening on {}", peer.url());

    let closed = match args.command {
        Command::SendImage { input, data_uri } => {
            let bytes = std::fs::read(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            peer.send_one(image_message(&bytes, data_uri))?
        }
        Command::SendJson { payload } => peer.send_one(payload)?,
        Command::Receive { output } => {
            let message = peer.receive_one()?;
            match output {
                Some(path) => save_pushed_image(&message, &path)?,
                None => println!("{}", message),
            }
            true
        }
    };

    if !closed {
        warn!("⚠️  Client left without a close frame");
    }

    Ok(())
}

fn save_pushed_image(message: &str, path: &Path) -> anyhow::Result<()> {
    let fields = envelope::unwrap(message.as_bytes())?;
    let Some(encoded) = fields.get(IMAGE_KEY).and_then(|v| v.as_str()) else {
        warn!("⚠️  Received message has no image; nothing saved");
        return Ok(());
    };

    let jpeg = general_purpose::STANDARD.decode(envelope::base64_payload(encoded))?;
    std::fs::write(path, &jpeg)?;
    info!("💾 Saved {} byte JPEG to {}", jpeg.len(), path.display());
    Ok(())
}
