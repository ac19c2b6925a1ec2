//! Exact flat L2 vector index over embedded chunks
//!
//! Entries keep insertion order, which is also the tie-break order for equal
//! distances. Writers take the state lock exclusively; searches share it.

mod store;

pub use store::LoadOutcome;

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{DocentError, Result};
use crate::models::{Chunk, EmbeddedChunk, SearchHit, SourceSummary};
use crate::services::embeddings::Embedder;

/// Text embedded once at creation to learn the model's dimension
pub const SAMPLE_TEXT: &str = "hello world";

/// Chunks sent to the embedder per request
const EMBED_BATCH_SIZE: usize = 64;

pub struct VectorIndex {
  embedder: Arc<dyn Embedder>,
  state: RwLock<IndexState>,
}

struct IndexState {
  dimension: usize,
  embedding_model: String,
  entries: Vec<EmbeddedChunk>,
  positions: HashMap<Uuid, usize>,
}

impl IndexState {
  fn new(dimension: usize, embedding_model: String, entries: Vec<EmbeddedChunk>) -> Self {
    let positions = entries.iter().enumerate().map(|(i, e)| (e.chunk_id, i)).collect();
    Self { dimension, embedding_model, entries, positions }
  }
}

impl VectorIndex {
  /// Empty index whose dimension comes from embedding a sample text
  pub async fn create(embedder: Arc<dyn Embedder>) -> Result<Self> {
    let sample = embedder.embed(SAMPLE_TEXT).await?;
    if sample.is_empty() {
      return Err(DocentError::EmbeddingService("sample embedding was empty".to_string()));
    }

    bentley::verbose!("Embedding model {} produces {} dimensions", embedder.model_name(), sample.len());
    Ok(Self::from_parts(embedder.clone(), sample.len(), embedder.model_name(), Vec::new()))
  }

  /// Like [`create`](Self::create), but the sample embedding must match `expected`
  pub async fn create_with_dimension(embedder: Arc<dyn Embedder>, expected: usize) -> Result<Self> {
    let index = Self::create(embedder).await?;
    let actual = index.dimension().await;
    if actual != expected {
      return Err(DocentError::IndexDimensionMismatch { expected, actual });
    }
    Ok(index)
  }

  pub(crate) fn from_parts(
    embedder: Arc<dyn Embedder>,
    dimension: usize,
    embedding_model: String,
    entries: Vec<EmbeddedChunk>,
  ) -> Self {
    Self { embedder, state: RwLock::new(IndexState::new(dimension, embedding_model, entries)) }
  }

  /// Embed and insert `chunks`, returning one fresh id per chunk.
  ///
  /// Every chunk is embedded and checked before anything is inserted, so a
  /// failure leaves the index untouched. Adding the same chunk twice stores it
  /// twice under different ids.
  pub async fn add(&self, chunks: Vec<Chunk>) -> Result<Vec<Uuid>> {
    if chunks.is_empty() {
      return Ok(Vec::new());
    }

    let dimension = self.dimension().await;
    let mut vectors = Vec::with_capacity(chunks.len());
    for batch in chunks.chunks(EMBED_BATCH_SIZE) {
      let texts: Vec<String> = batch.iter().map(|c| c.text.clone()).collect();
      vectors.extend(self.embedder.embed_batch(&texts).await?);
      bentley::verbose!("Embedded {}/{} chunks", vectors.len(), chunks.len());
    }

    if vectors.len() != chunks.len() {
      return Err(DocentError::EmbeddingService(format!(
        "expected {} embeddings, received {}",
        chunks.len(),
        vectors.len()
      )));
    }
    if let Some(bad) = vectors.iter().find(|v| v.len() != dimension) {
      return Err(DocentError::IndexDimensionMismatch { expected: dimension, actual: bad.len() });
    }
    if let Some(position) = vectors.iter().position(|v| !all_finite(v)) {
      return Err(DocentError::EmbeddingService(format!(
        "embedding for chunk {position} contains NaN or infinite values"
      )));
    }

    let mut state = self.state.write().await;
    let mut ids = Vec::with_capacity(chunks.len());
    for (chunk, vector) in chunks.into_iter().zip(vectors) {
      let chunk_id = Uuid::new_v4();
      let position = state.entries.len();
      state.entries.push(EmbeddedChunk { chunk_id, vector, chunk });
      state.positions.insert(chunk_id, position);
      ids.push(chunk_id);
    }

    bentley::info!("Indexed {} chunks ({} total)", ids.len(), state.entries.len());
    Ok(ids)
  }

  /// The `k` chunks closest to `query`, nearest first
  pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
    if k == 0 || self.is_empty().await {
      return Ok(Vec::new());
    }

    let query_vector = self.embedder.embed(query).await?;
    if !all_finite(&query_vector) {
      return Err(DocentError::EmbeddingService(
        "query embedding contains NaN or infinite values".to_string(),
      ));
    }

    let state = self.state.read().await;
    if query_vector.len() != state.dimension {
      return Err(DocentError::IndexDimensionMismatch {
        expected: state.dimension,
        actual: query_vector.len(),
      });
    }

    let mut scored: Vec<(usize, f32)> = state
      .entries
      .iter()
      .enumerate()
      .map(|(position, entry)| (position, squared_l2(&query_vector, &entry.vector)))
      .collect();
    // stable: equal distances stay in insertion order
    scored.sort_by(|a, b| a.1.total_cmp(&b.1));

    Ok(
      scored
        .into_iter()
        .take(k)
        .map(|(position, distance)| {
          let entry = &state.entries[position];
          SearchHit { chunk_id: entry.chunk_id, chunk: entry.chunk.clone(), distance }
        })
        .collect(),
    )
  }

  pub async fn get(&self, chunk_id: &Uuid) -> Option<Chunk> {
    let state = self.state.read().await;
    state.positions.get(chunk_id).map(|&position| state.entries[position].chunk.clone())
  }

  pub async fn len(&self) -> usize {
    self.state.read().await.entries.len()
  }

  pub async fn is_empty(&self) -> bool {
    self.state.read().await.entries.is_empty()
  }

  pub async fn dimension(&self) -> usize {
    self.state.read().await.dimension
  }

  pub async fn embedding_model(&self) -> String {
    self.state.read().await.embedding_model.clone()
  }

  /// One summary per source document, ordered by path
  pub async fn sources(&self) -> Vec<SourceSummary> {
    struct Tally<'a> {
      first: &'a Chunk,
      pages: BTreeSet<usize>,
      chunks: usize,
    }

    let state = self.state.read().await;
    let mut by_source: BTreeMap<&str, Tally> = BTreeMap::new();
    for entry in &state.entries {
      let chunk = &entry.chunk;
      let tally = by_source
        .entry(chunk.metadata.source_path.as_str())
        .or_insert_with(|| Tally { first: chunk, pages: BTreeSet::new(), chunks: 0 });
      tally.pages.insert(chunk.metadata.page_number);
      tally.chunks += 1;
    }

    by_source
      .into_iter()
      .map(|(source_path, tally)| SourceSummary {
        source_path: source_path.to_string(),
        product_type: tally.first.metadata.product_type.clone(),
        doc_type: tally.first.metadata.doc_type.clone(),
        pages: tally.pages.len(),
        chunks: tally.chunks,
      })
      .collect()
  }
}

/// JSON has no NaN or infinity, so such vectors could never be persisted
fn all_finite(vector: &[f32]) -> bool {
  vector.iter().all(|x| x.is_finite())
}

/// Squared Euclidean distance, the figure a flat L2 index ranks by
fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
  a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
