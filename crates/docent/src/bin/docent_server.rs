//! Docent REST Server
//!
//! HTTP API over the conversation pipeline: per-session chat turns, history,
//! raw retrieval and index status.

use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use docent::config::{MemoryBackend, Settings};
use docent::runtime::Runtime;
use docent::server::startup::start_server;

#[derive(Parser)]
#[command(name = "docent_server")]
#[command(about = "Docent REST API Server")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), ", courtesy of Kernelle Software"))]
struct Args {
  /// Server bind address
  #[arg(long, default_value = "127.0.0.1:3000")]
  bind: SocketAddr,

  /// Settings file (defaults to $DOCENT_CONFIG or ~/.docent/config.yaml)
  #[arg(long)]
  config: Option<PathBuf>,

  /// Session history backend, overriding the settings file
  #[arg(long, value_enum)]
  memory: Option<MemoryBackend>,

  /// Enable verbose logging
  #[arg(short, long)]
  verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();

  let filter = if args.verbose {
    bentley::set_verbose(true);
    EnvFilter::new("docent=debug,tower_http=debug,info")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docent=info,warn"))
  };
  tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

  let mut settings = Settings::load(args.config.as_deref())?;
  if let Some(memory) = args.memory {
    settings.memory = memory;
  }

  bentley::info!("Starting Docent REST Server v{}", env!("CARGO_PKG_VERSION"));
  bentley::info!("Binding to address: {}", args.bind);

  let runtime = Runtime::start(settings).await?;
  start_server(runtime, args.bind).await?;

  Ok(())
}
