//! Offline stand-ins for the embedding and chat services
#![allow(dead_code)]

use async_trait::async_trait;
use docent::config::Settings;
use docent::services::embeddings::Embedder;
use docent::services::llm::{ChatMessage, ChatRole, GenerationParams, LanguageModel};
use docent::Result;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const DIMENSION: usize = 256;

/// Bag-of-words embedding: each lowercase word bumps one hashed bucket.
/// Texts sharing words end up close in L2.
pub struct HashEmbedder;

impl HashEmbedder {
  pub fn vector(text: &str) -> Vec<f32> {
    let mut vector = vec![0.0; DIMENSION];
    for word in text.split(|c: char| !c.is_alphanumeric()).filter(|w| !w.is_empty()) {
      let bucket = word
        .to_lowercase()
        .bytes()
        .fold(17usize, |hash, byte| hash.wrapping_mul(31).wrapping_add(byte as usize));
      vector[bucket % DIMENSION] += 1.0;
    }
    vector
  }
}

#[async_trait]
impl Embedder for HashEmbedder {
  fn model_name(&self) -> String {
    "hash-embedder".to_string()
  }

  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    Ok(texts.iter().map(|t| Self::vector(t)).collect())
  }
}

/// Answers every prompt with the last human message, counting calls
#[derive(Default)]
pub struct EchoModel {
  calls: AtomicUsize,
}

impl EchoModel {
  pub fn calls(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl LanguageModel for EchoModel {
  fn model_name(&self) -> String {
    "echo".to_string()
  }

  async fn generate(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
    self.calls.fetch_add(1, Ordering::SeqCst);
    let question = messages
      .iter()
      .rev()
      .find(|m| m.role == ChatRole::Human)
      .map(|m| m.content.clone())
      .unwrap_or_default();
    Ok(format!("answer: {question}"))
  }
}

pub fn embedder() -> Arc<dyn Embedder> {
  Arc::new(HashEmbedder)
}

/// Settings rooted entirely inside `root`
pub fn settings_in(root: &Path) -> Settings {
  Settings {
    root: root.to_path_buf(),
    documents_dir: root.join("files"),
    auto_ingest: false,
    ..Settings::default()
  }
}

/// Write a small manual corpus laid out as `files/<doc_type>/<product>/<name>`
pub fn write_corpus(root: &Path) {
  let manuals = root.join("files").join("manuals");
  let opener = manuals.join("opener-x200");
  let remote = manuals.join("remote-r5");
  std::fs::create_dir_all(&opener).unwrap();
  std::fs::create_dir_all(&remote).unwrap();

  std::fs::write(
    opener.join("install.txt"),
    "Mount the rail to the header bracket.\n\nConnect the safety sensors at both sides of the door.",
  )
  .unwrap();
  std::fs::write(
    opener.join("troubleshooting.md"),
    "If the door reverses, clean the safety sensors and check the alignment lights.",
  )
  .unwrap();
  std::fs::write(
    remote.join("pairing.txt"),
    "Press the learn button on the motor head, then press the remote button within thirty seconds.",
  )
  .unwrap();
}
