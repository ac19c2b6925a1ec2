//! On-disk form of the vector index
//!
//! A single `index.json` per index directory. Writes go to a sibling temp file
//! that is renamed into place, so a crash never leaves a half-written index.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::{VectorIndex, SAMPLE_TEXT};
use crate::error::{DocentError, Result};
use crate::models::EmbeddedChunk;
use crate::services::embeddings::Embedder;

pub const INDEX_FILE: &str = "index.json";
const FORMAT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct IndexFile {
  format_version: u32,
  dimension: usize,
  embedding_model: String,
  entries: Vec<EmbeddedChunk>,
}

/// Result of reading a persisted index
pub enum LoadOutcome {
  Loaded(VectorIndex),
  /// No index has been written to the directory yet
  NotFound,
  /// Something is there but it cannot be used
  Corrupt(String),
}

impl VectorIndex {
  /// Write the whole index to `dir/index.json`
  pub async fn persist(&self, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir).await?;

    let contents = {
      let state = self.state.read().await;
      let file = IndexFileRef {
        format_version: FORMAT_VERSION,
        dimension: state.dimension,
        embedding_model: &state.embedding_model,
        entries: &state.entries,
      };
      serde_json::to_vec(&file)?
    };

    let target = dir.join(INDEX_FILE);
    let staging = temp_path(dir);
    tokio::fs::write(&staging, &contents).await?;
    tokio::fs::rename(&staging, &target).await?;

    bentley::verbose!("Persisted index to {}", target.display());
    Ok(())
  }

  /// Read `dir/index.json`; the embedder is attached but not consulted
  pub async fn load(dir: &Path, embedder: Arc<dyn Embedder>) -> LoadOutcome {
    let path = dir.join(INDEX_FILE);
    let raw = match tokio::fs::read(&path).await {
      Ok(raw) => raw,
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LoadOutcome::NotFound,
      Err(e) => return LoadOutcome::Corrupt(format!("cannot read {}: {e}", path.display())),
    };

    let file: IndexFile = match serde_json::from_slice(&raw) {
      Ok(file) => file,
      Err(e) => return LoadOutcome::Corrupt(format!("{} is not a valid index: {e}", path.display())),
    };

    if file.format_version != FORMAT_VERSION {
      return LoadOutcome::Corrupt(format!(
        "unsupported index format version {} (expected {FORMAT_VERSION})",
        file.format_version
      ));
    }
    if let Some(entry) = file.entries.iter().find(|e| e.vector.len() != file.dimension) {
      return LoadOutcome::Corrupt(format!(
        "entry {} has {} dimensions, index declares {}",
        entry.chunk_id,
        entry.vector.len(),
        file.dimension
      ));
    }

    LoadOutcome::Loaded(Self::from_parts(embedder, file.dimension, file.embedding_model, file.entries))
  }

  /// Load the index in `dir`, or start a fresh one when there is none or it is unreadable.
  ///
  /// A stored index whose dimension differs from the live embedder (or from
  /// `expected_dimension`) is a fatal error rather than a silent rebuild.
  pub async fn open_or_create(
    dir: &Path,
    embedder: Arc<dyn Embedder>,
    expected_dimension: Option<usize>,
  ) -> Result<Self> {
    match Self::load(dir, embedder.clone()).await {
      LoadOutcome::Loaded(index) => {
        let stored = index.dimension().await;
        let live = embedder.embed(SAMPLE_TEXT).await?.len();
        if live != stored {
          return Err(DocentError::IndexDimensionMismatch { expected: stored, actual: live });
        }
        if let Some(expected) = expected_dimension.filter(|&e| e != stored) {
          return Err(DocentError::IndexDimensionMismatch { expected, actual: stored });
        }

        let stored_model = index.embedding_model().await;
        if stored_model != embedder.model_name() {
          bentley::warn!(
            "Index was built with {stored_model} but {} is configured; results may be poor",
            embedder.model_name()
          );
        }

        bentley::info!("Loaded vector index with {} chunks from {}", index.len().await, dir.display());
        Ok(index)
      }
      LoadOutcome::NotFound => {
        bentley::info!("No vector index at {}, creating a new one", dir.display());
        Self::fresh(embedder, expected_dimension).await
      }
      LoadOutcome::Corrupt(reason) => {
        bentley::warn!("{reason}\nCreating a new vector index...");
        Self::fresh(embedder, expected_dimension).await
      }
    }
  }

  async fn fresh(embedder: Arc<dyn Embedder>, expected_dimension: Option<usize>) -> Result<Self> {
    match expected_dimension {
      Some(expected) => Self::create_with_dimension(embedder, expected).await,
      None => Self::create(embedder).await,
    }
  }
}

/// Borrowing twin of [`IndexFile`] so persisting does not clone every vector
#[derive(Serialize)]
struct IndexFileRef<'a> {
  format_version: u32,
  dimension: usize,
  embedding_model: &'a str,
  entries: &'a [EmbeddedChunk],
}

fn temp_path(dir: &Path) -> PathBuf {
  dir.join(format!(".{INDEX_FILE}.{}.tmp", uuid::Uuid::new_v4().simple()))
}
