use anyhow::Result;
use clap::{Parser, Subcommand};
use docent::cli::commands;
use docent::config::{MemoryBackend, Settings};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docent")]
#[command(about = "Docent - conversational question answering over your product manuals")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), ", courtesy of Kernelle Software"))]
struct Cli {
  /// Settings file (defaults to $DOCENT_CONFIG or ~/.docent/config.yaml)
  #[arg(long, global = true)]
  config: Option<PathBuf>,

  /// Session history backend, overriding the settings file
  #[arg(long, global = true, value_enum)]
  memory: Option<MemoryBackend>,

  /// Print verbose progress
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Split, embed and index documents
  Ingest {
    /// File or directory to ingest (defaults to the configured documents directory)
    source: Option<PathBuf>,
  },
  /// Start an interactive chat; type 'bye' to leave
  Chat {
    /// Resume or name a session
    #[arg(short, long)]
    session: Option<String>,
  },
  /// Ask a single question
  Ask {
    #[arg(short, long, default_value = "default")]
    session: String,
    #[arg(required = true)]
    question: Vec<String>,
  },
  /// Show the chunks retrieved for a query
  Search {
    /// Number of chunks to show
    #[arg(short = 'k', long, default_value = "4")]
    limit: usize,
    #[arg(required = true)]
    terms: Vec<String>,
  },
  /// Show a session's turns, or list sessions
  History {
    session: Option<String>,
  },
  /// List indexed documents
  Sources,
  /// Print the effective settings
  Config,
}

async fn handle(command: Command, settings: Settings) -> Result<()> {
  match command {
    Command::Ingest { source } => commands::ingest(settings, source).await,
    Command::Chat { session } => commands::chat(settings, session).await,
    Command::Ask { session, question } => commands::ask(settings, &session, &question).await,
    Command::Search { limit, terms } => commands::search(settings, &terms, limit).await,
    Command::History { session } => commands::history(settings, session).await,
    Command::Sources => commands::sources(settings).await,
    Command::Config => commands::config(&settings),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  if cli.verbose {
    bentley::set_verbose(true);
  }

  let mut settings = Settings::load(cli.config.as_deref())?;
  if let Some(memory) = cli.memory {
    settings.memory = memory;
  }

  handle(cli.command, settings).await
}
