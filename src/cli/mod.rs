//! Command-line interface parsing and handling
//!
//! This module parses arguments, layers them over the config file, sets up
//! diagnostic tracing, and starts the chat screen.

use std::error::Error;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::core::config::{Config, EndpointMode};
use crate::ui::chat_loop::run_chat;
use crate::utils::logging::LoggingState;

const DEFAULT_TRACE_FILTER: &str = "image_analyzer=info";

#[derive(Parser, Debug)]
#[command(name = "image-analyzer")]
#[command(version)]
#[command(about = "A terminal chat panel for asking questions about images")]
#[command(
    long_about = "Image Analyzer is a full-screen terminal chat panel. Select a PNG or JPEG \
image, optionally type a question, and send both to a remote inference service. \
Replies are shown as chat bubbles with embedded JSON pretty-printed.\n\n\
Modes:\n\
  dual              Send the image to the ask and image-data endpoints together (default)\n\
  single            Send an optional image and a question to the ask endpoint\n\n\
Controls:\n\
  Type a path       Enter it in the Image field and press Enter to select it\n\
  Enter             Send the pending submission\n\
  Tab               Switch between the Image and Question fields (single mode)\n\
  Up/Down/PgUp/PgDn Scroll through the conversation (mouse wheel works too)\n\
  Ctrl+Home/End     Jump to the first or newest entry\n\
  Esc or Ctrl+C     Quit the application"
)]
pub struct Args {
    /// Read configuration from this TOML file instead of the default location
    #[arg(short = 'c', long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Endpoint mode
    #[arg(short = 'm', long, value_enum)]
    pub mode: Option<EndpointMode>,

    /// URL of the question-answering endpoint
    #[arg(long, value_name = "URL")]
    pub ask_url: Option<String>,

    /// URL of the image classification endpoint
    #[arg(long, value_name = "URL")]
    pub image_data_url: Option<String>,

    /// Per-request timeout in seconds
    #[arg(short = 't', long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Append the conversation to this file
    #[arg(short = 'l', long, value_name = "FILE")]
    pub log: Option<String>,

    /// Write diagnostic tracing output to this file
    #[arg(long, value_name = "FILE")]
    pub debug_log: Option<String>,
}

impl Args {
    /// Layers command-line values over the loaded config.
    pub fn apply_to(&self, mut config: Config) -> Config {
        if let Some(mode) = self.mode {
            config.mode = Some(mode);
        }
        if let Some(url) = &self.ask_url {
            config.ask_url = Some(url.clone());
        }
        if let Some(url) = &self.image_data_url {
            config.image_data_url = Some(url.clone());
        }
        if let Some(secs) = self.timeout {
            config.timeout_secs = Some(secs);
        }
        if let Some(path) = &self.debug_log {
            config.debug_log = Some(path.clone());
        }
        config
    }

    pub fn resolve_config(&self) -> Result<Config, Box<dyn Error>> {
        let base = match &self.config {
            Some(path) => Config::load_from_path(path)?,
            None => Config::load()?,
        };
        let config = self.apply_to(base);
        config.validate()?;
        Ok(config)
    }
}

/// Installs a file-backed subscriber. The terminal belongs to the UI, so
/// without a target file tracing output is dropped.
fn init_tracing(debug_log: Option<&str>) -> Result<(), Box<dyn Error>> {
    let Some(path) = debug_log else {
        return Ok(());
    };
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_TRACE_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()?;
    Ok(())
}

pub fn main() -> Result<(), Box<dyn Error>> {
    let args = Args::parse();
    let config = match args.resolve_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ {e}");
            std::process::exit(1);
        }
    };

    init_tracing(config.debug_log.as_deref())?;

    let transcript = match LoggingState::new(args.log.clone()) {
        Ok(state) => state,
        Err(e) => {
            eprintln!("❌ Cannot write transcript log: {e}");
            std::process::exit(1);
        }
    };

    tokio::runtime::Runtime::new()?.block_on(run_chat(config, transcript))
}
