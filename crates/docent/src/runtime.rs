//! Wiring: settings in, a ready conversation out

use std::path::Path;
use std::sync::Arc;

use crate::chain::{Answerer, Contextualizer, Conversation};
use crate::config::Settings;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::ingest::DocumentLoader;
use crate::memory::{self, SessionStore};
use crate::services::embeddings::{Embedder, OllamaEmbedder};
use crate::services::llm::{GenerationParams, LanguageModel, OllamaChat};

/// Everything a surface needs, built once per process
pub struct Runtime {
  pub settings: Settings,
  pub index: Arc<VectorIndex>,
  pub store: Arc<dyn SessionStore>,
  pub conversation: Arc<Conversation>,
  pub chat_model: String,
}

impl Runtime {
  /// Connect to the configured Ollama models and open the index and session store
  pub async fn start(settings: Settings) -> Result<Self> {
    let timeout = settings.request_timeout_secs;
    let embedder = Arc::new(OllamaEmbedder::new(&settings.ollama_url, &settings.embedding_model, timeout)?);
    let llm = Arc::new(OllamaChat::new(&settings.ollama_url, &settings.chat_model, timeout)?);
    Self::with_services(settings, embedder, llm).await
  }

  pub async fn with_services(
    settings: Settings,
    embedder: Arc<dyn Embedder>,
    llm: Arc<dyn LanguageModel>,
  ) -> Result<Self> {
    let index = Arc::new(
      VectorIndex::open_or_create(&settings.index_dir(), embedder, settings.expected_dimension).await?,
    );
    let store = memory::from_settings(&settings)?;

    let params = GenerationParams { temperature: settings.temperature };
    let conversation = Arc::new(Conversation::new(
      store.clone(),
      index.clone(),
      Contextualizer::new(llm.clone(), params),
      Answerer::new(llm.clone(), index.clone(), params, settings.top_k)
        .with_strict_empty_context(settings.strict_empty_context),
    ));

    Ok(Self { chat_model: llm.model_name(), settings, index, store, conversation })
  }

  /// Load, split, embed and persist everything under `source`; returns the chunk count
  pub async fn ingest(&self, source: &Path) -> Result<usize> {
    let chunks = DocumentLoader::from_settings(&self.settings).load_and_split(source).await;
    if chunks.is_empty() {
      return Ok(0);
    }

    let ids = self.index.add(chunks).await?;
    self.index.persist(&self.settings.index_dir()).await?;
    Ok(ids.len())
  }

  /// Ingest `documents_dir` when the index is empty and auto-ingest is on
  pub async fn ensure_ingested(&self) -> Result<usize> {
    if !self.settings.auto_ingest || !self.index.is_empty().await {
      return Ok(0);
    }

    bentley::info!("Index is empty, ingesting {}", self.settings.documents_dir.display());
    self.ingest(&self.settings.documents_dir).await
  }
}
