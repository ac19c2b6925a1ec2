//! Error taxonomy shared by every docent component
//!
//! Components return these unmodified; only the conversation layer and the
//! user-facing surfaces turn them into text a person reads.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocentError {
  #[error("Failed to ingest documents from {path}: {message}")]
  Ingestion { path: String, message: String },

  #[error("Embedding dimension mismatch: index expects {expected}, model produced {actual}")]
  IndexDimensionMismatch { expected: usize, actual: usize },

  #[error("Embedding service error: {0}")]
  EmbeddingService(String),

  #[error("Language model service error: {0}")]
  LanguageModelService(String),

  #[error("Session store error: {0}")]
  SessionStore(String),

  #[error("{service} request timed out after {seconds}s")]
  Timeout { service: &'static str, seconds: u64 },

  #[error("Invalid configuration: {0}")]
  Config(String),

  #[error(transparent)]
  Io(#[from] std::io::Error),

  #[error(transparent)]
  Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DocentError>;

impl DocentError {
  /// Whether the failure came from an external model or embedding call
  pub fn is_service_failure(&self) -> bool {
    matches!(
      self,
      Self::EmbeddingService(_) | Self::LanguageModelService(_) | Self::Timeout { .. }
    )
  }
}
