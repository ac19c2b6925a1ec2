//! Core data types passed between ingestion, the index and the surfaces

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a chunk came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ChunkMetadata {
  pub source_path: String,
  /// 1-based page within the source document
  pub page_number: usize,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub product_type: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub doc_type: Option<String>,
}

/// A bounded span of document text with its provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Chunk {
  pub text: String,
  pub metadata: ChunkMetadata,
}

impl Chunk {
  pub fn new(text: impl Into<String>, metadata: ChunkMetadata) -> Self {
    Self { text: text.into(), metadata }
  }
}

/// A chunk as stored in the index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedChunk {
  pub chunk_id: Uuid,
  pub vector: Vec<f32>,
  pub chunk: Chunk,
}

/// One ranked retrieval result; `distance` is L2, lower is closer
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SearchHit {
  pub chunk_id: Uuid,
  pub chunk: Chunk,
  pub distance: f32,
}

/// Per-document summary of what the index holds
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SourceSummary {
  pub source_path: String,
  pub product_type: Option<String>,
  pub doc_type: Option<String>,
  /// Distinct pages that produced at least one chunk
  pub pages: usize,
  pub chunks: usize,
}
