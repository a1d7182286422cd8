//! # Bridge Binary Entry Point
//!
//! Runs one exchange from the command line.
//!
//! ## Usage
//!
//! ```bash
//! oxley-bridge pull-image --url ws://127.0.0.1:9001 --output frame.png
//! oxley-bridge push-image --url ws://127.0.0.1:9001 --input photo.jpg
//! oxley-bridge pull-fields --url ws://127.0.0.1:9001 --fields prompt seed steps
//! oxley-bridge download --url https://example.com/cat.jpg --output cat.png
//! ```
//!
//! A TOML file passed with `--config` sets JPEG quality, HTTP timeout, and
//! log level.

use std::path::{Path, PathBuf};

use anyhow::bail;
use clap::{Parser, Subcommand};
use log::info;
use serde_json::Value;

use oxley_bridge::common::config::BridgeConfig;
use oxley_bridge::common::logging::init_logger;
use oxley_bridge::{Exchange, NormalizedImage};

/// Command-line arguments for the bridge binary
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Receive one image envelope over WebSocket and save it
    PullImage {
        #[arg(long)]
        url: String,
        /// Output file; format follows the extension
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Send an image file over WebSocket as a JPEG envelope
    PushImage {
        #[arg(long)]
        url: String,
        #[arg(short, long)]
        input: PathBuf,
    },
    /// Receive one JSON message over WebSocket and print three fields
    PullFields {
        #[arg(long)]
        url: String,
        #[arg(long, num_args = 3, required = true)]
        fields: Vec<String>,
    },
    /// Download an image over HTTP and save it
    Download {
        #[arg(long)]
        url: String,
        #[arg(short, long)]
        output: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = BridgeConfig::from_optional_file(args.config.as_deref())?;
    init_logger(config.logging.level_filter());

    let exchange = Exchange::from_config(&config);

    match args.command {
        Command::PullImage { url, output } => match exchange.pull_image(&url)? {
            Some(image) => save_image(&exchange, &image, &output)?,
            None => println!("No image received from {}", url),
        },
        Command::PushImage { url, input } => {
            let bytes = std::fs::read(&input)?;
            let image = exchange.codec().decode(&bytes)?;
            let status = exchange.push_image(&url, image.as_tensor())?;
            println!("{}", status);
        }
        Command::PullFields { url, fields } => {
            let [first, second, third] = fields.as_slice() else {
                bail!("expected exactly three field names, got {}", fields.len());
            };
            let (a, b, c) = exchange.pull_fields(&url, [first.as_str(), second.as_str(), third.as_str()])?;
            for (name, value) in [(first, a), (second, b), (third, c)] {
                println!("{} = {}", name, display_value(&value));
            }
        }
        Command::Download { url, output } => {
            let image = exchange.download_image(&url)?;
            save_image(&exchange, &image, &output)?;
        }
    }

    Ok(())
}

fn save_image(exchange: &Exchange, image: &NormalizedImage, output: &Path) -> anyhow::Result<()> {
    exchange
        .codec()
        .to_dynamic_image(image.as_tensor())?
        .save(output)?;
    info!(
        "💾 Saved {}x{} image to {}",
        image.width(),
        image.height(),
        output.display()
    );
    Ok(())
}

/// Strings print bare; everything else prints as JSON.
fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
