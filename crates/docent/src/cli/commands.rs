use anyhow::{anyhow, Result};
use colored::*;
use std::path::PathBuf;
use std::sync::Arc;
use uuid::Uuid;

use super::display::{assistant_line, display_search_hit, display_session, display_sources};
use super::repl;
use crate::config::Settings;
use crate::index::{LoadOutcome, VectorIndex};
use crate::memory;
use crate::runtime::Runtime;
use crate::services::embeddings::OllamaEmbedder;

/// Index the documents under `source` (or the configured documents directory)
pub async fn ingest(settings: Settings, source: Option<PathBuf>) -> Result<()> {
  let source = source.unwrap_or_else(|| settings.documents_dir.clone());
  let runtime = Runtime::start(settings).await?;

  let added = runtime.ingest(&source).await?;
  if added == 0 {
    println!("No chunks were added from {}", source.display().to_string().yellow());
    return Ok(());
  }

  println!(
    "{} Indexed {} chunks from {} ({} total)",
    "✓".green(),
    added.to_string().cyan(),
    source.display().to_string().cyan(),
    runtime.index.len().await
  );
  Ok(())
}

/// Interactive chat on stdin/stdout
pub async fn chat(settings: Settings, session: Option<String>) -> Result<()> {
  let runtime = Runtime::start(settings).await?;
  runtime.ensure_ingested().await?;

  let session_id = session.unwrap_or_else(|| Uuid::new_v4().simple().to_string());
  bentley::announce!("Conversational RAG Chatbot");
  println!("Session {} (type '{}' to quit)", session_id.cyan(), repl::EXIT_WORD.yellow());

  let stdin = tokio::io::BufReader::new(tokio::io::stdin());
  let mut stdout = tokio::io::stdout();
  repl::run(runtime.conversation.as_ref(), &session_id, stdin, &mut stdout).await?;
  Ok(())
}

/// Answer a single question and exit
pub async fn ask(settings: Settings, session: &str, question: &[String]) -> Result<()> {
  let runtime = Runtime::start(settings).await?;
  runtime.ensure_ingested().await?;

  let reply = runtime.conversation.reply(session, &question.join(" ")).await?;
  if let Some(failure) = &reply.failure {
    bentley::verbose!("Turn degraded: {failure}");
  }
  print!("{}", assistant_line(&reply.message));
  Ok(())
}

/// Show the chunks retrieval would hand to the model
pub async fn search(settings: Settings, terms: &[String], limit: usize) -> Result<()> {
  let runtime = Runtime::start(settings).await?;
  let hits = runtime.conversation.search(&terms.join(" "), limit).await?;

  if hits.is_empty() {
    println!("No matching chunks. Has anything been ingested?");
    return Ok(());
  }
  for (rank, hit) in hits.iter().enumerate() {
    display_search_hit(rank + 1, hit);
  }
  Ok(())
}

/// Print one session's turns, or list sessions when no id is given
pub async fn history(settings: Settings, session: Option<String>) -> Result<()> {
  let store = memory::from_settings(&settings)?;

  let Some(session_id) = session else {
    let sessions = store.list_sessions().await?;
    if sessions.is_empty() {
      println!("No sessions recorded in {}", settings.sessions_dir().display());
    }
    for id in sessions {
      println!("  {}", id.cyan());
    }
    return Ok(());
  };

  let session = store.get_history(&session_id).await?;
  if session.turns.is_empty() {
    println!("No turns recorded for session {}", session_id.yellow());
    return Ok(());
  }
  display_session(&session);
  Ok(())
}

/// Summarise the persisted index without contacting the model services
pub async fn sources(settings: Settings) -> Result<()> {
  let dir = settings.index_dir();
  let embedder = Arc::new(OllamaEmbedder::new(
    &settings.ollama_url,
    &settings.embedding_model,
    settings.request_timeout_secs,
  )?);

  let index = match VectorIndex::load(&dir, embedder).await {
    LoadOutcome::Loaded(index) => index,
    LoadOutcome::NotFound => {
      println!("No index found at {}. Run `docent ingest` first.", dir.display());
      return Ok(());
    }
    LoadOutcome::Corrupt(reason) => return Err(anyhow!("Index at {} is unusable: {reason}", dir.display())),
  };

  let sources = index.sources().await;
  println!(
    "{} documents, {} chunks, {} dimensions ({})",
    sources.len().to_string().cyan(),
    index.len().await.to_string().cyan(),
    index.dimension().await,
    index.embedding_model().await
  );
  display_sources(&sources);
  Ok(())
}

/// Print the effective configuration as YAML
pub fn config(settings: &Settings) -> Result<()> {
  print!("{}", settings.to_yaml()?);
  Ok(())
}
