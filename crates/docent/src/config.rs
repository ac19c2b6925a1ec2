//! Runtime settings
//!
//! Resolution order: built-in defaults, then the YAML file
//! (`$DOCENT_CONFIG` or `<root>/config.yaml`), then `DOCENT_*` environment
//! variables, then whatever the binaries apply from their command line.

use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocentError, Result};

pub const ROOT_ENV: &str = "DOCENT_ROOT";
pub const CONFIG_ENV: &str = "DOCENT_CONFIG";

/// Which session history backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryBackend {
  /// Lives for the process only
  InMemory,
  /// One JSONL file per session under `sessions_dir`
  Durable,
}

/// How `product_type` and `doc_type` are read from a document's path.
///
/// Depths count ancestor directories of the file: 1 is the directory holding
/// the file, 2 its parent, and so on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaxonomyRule {
  pub enabled: bool,
  pub product_depth: usize,
  pub doc_type_depth: usize,
}

impl Default for TaxonomyRule {
  fn default() -> Self {
    Self { enabled: true, product_depth: 1, doc_type_depth: 2 }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
  /// Base directory for the index, sessions and logs
  pub root: PathBuf,
  /// Where the manuals live
  pub documents_dir: PathBuf,
  pub index_dir: Option<PathBuf>,
  pub sessions_dir: Option<PathBuf>,
  pub memory: MemoryBackend,

  pub ollama_url: String,
  pub chat_model: String,
  pub embedding_model: String,
  pub temperature: f32,
  pub request_timeout_secs: u64,
  /// Fail startup when the embedding model's dimension differs from this
  pub expected_dimension: Option<usize>,

  pub top_k: usize,
  pub chunk_size: usize,
  pub chunk_overlap: usize,
  pub taxonomy: TaxonomyRule,
  /// Answer "I don't know" without a model call when retrieval finds nothing
  pub strict_empty_context: bool,
  /// Ingest `documents_dir` when the index is empty at chat startup
  pub auto_ingest: bool,
}

impl Default for Settings {
  fn default() -> Self {
    Self {
      root: default_root(),
      documents_dir: PathBuf::from("files"),
      index_dir: None,
      sessions_dir: None,
      memory: MemoryBackend::InMemory,
      ollama_url: "http://localhost:11434".to_string(),
      chat_model: "llama3.1".to_string(),
      embedding_model: "nomic-embed-text".to_string(),
      temperature: 0.5,
      request_timeout_secs: 120,
      expected_dimension: None,
      top_k: 4,
      chunk_size: 1000,
      chunk_overlap: 100,
      taxonomy: TaxonomyRule::default(),
      strict_empty_context: true,
      auto_ingest: true,
    }
  }
}

impl Settings {
  /// Load settings from `path`, or from the default location when `None`
  pub fn load(path: Option<&Path>) -> Result<Self> {
    let path = match path {
      Some(path) => Some(path.to_path_buf()),
      None => std::env::var(CONFIG_ENV).ok().map(PathBuf::from),
    };

    let mut settings = match path {
      Some(path) => Self::from_file(&path)?,
      None => {
        let implicit = default_root().join("config.yaml");
        if implicit.exists() {
          Self::from_file(&implicit)?
        } else {
          Self::default()
        }
      }
    };

    settings.apply_env();
    settings.validate()?;
    Ok(settings)
  }

  /// Parse a YAML settings file; missing keys take their defaults
  pub fn from_file(path: &Path) -> Result<Self> {
    let raw = std::fs::read_to_string(path)
      .map_err(|e| DocentError::Config(format!("cannot read {}: {e}", path.display())))?;
    Self::from_yaml(&raw)
  }

  pub fn from_yaml(raw: &str) -> Result<Self> {
    if raw.trim().is_empty() {
      return Ok(Self::default());
    }
    serde_yaml::from_str(raw).map_err(|e| DocentError::Config(e.to_string()))
  }

  /// Render as YAML, for `docent config`
  pub fn to_yaml(&self) -> Result<String> {
    serde_yaml::to_string(self).map_err(|e| DocentError::Config(e.to_string()))
  }

  fn apply_env(&mut self) {
    if let Ok(root) = std::env::var(ROOT_ENV) {
      self.root = PathBuf::from(root);
    }
    if let Ok(url) = std::env::var("DOCENT_OLLAMA_URL") {
      self.ollama_url = url;
    }
    if let Ok(model) = std::env::var("DOCENT_CHAT_MODEL") {
      self.chat_model = model;
    }
    if let Ok(model) = std::env::var("DOCENT_EMBED_MODEL") {
      self.embedding_model = model;
    }
    if let Ok(memory) = std::env::var("DOCENT_MEMORY") {
      match memory.as_str() {
        "in-memory" => self.memory = MemoryBackend::InMemory,
        "durable" => self.memory = MemoryBackend::Durable,
        other => bentley::warn!("Ignoring unknown DOCENT_MEMORY value '{other}'"),
      }
    }
  }

  pub fn validate(&self) -> Result<()> {
    if self.chunk_size == 0 {
      return Err(DocentError::Config("chunk_size must be greater than zero".into()));
    }
    if self.chunk_overlap >= self.chunk_size {
      return Err(DocentError::Config(format!(
        "chunk_overlap ({}) must be smaller than chunk_size ({})",
        self.chunk_overlap, self.chunk_size
      )));
    }
    if self.top_k == 0 {
      return Err(DocentError::Config("top_k must be at least 1".into()));
    }
    if self.taxonomy.enabled && (self.taxonomy.product_depth == 0 || self.taxonomy.doc_type_depth == 0)
    {
      return Err(DocentError::Config("taxonomy depths start at 1".into()));
    }
    Ok(())
  }

  pub fn index_dir(&self) -> PathBuf {
    self.index_dir.clone().unwrap_or_else(|| self.root.join("index"))
  }

  pub fn sessions_dir(&self) -> PathBuf {
    self.sessions_dir.clone().unwrap_or_else(|| self.root.join("sessions"))
  }

  pub fn server_logs_path(&self) -> PathBuf {
    self.root.join("server.logs.jsonl")
  }
}

fn default_root() -> PathBuf {
  if let Ok(custom_root) = std::env::var(ROOT_ENV) {
    return PathBuf::from(custom_root);
  }

  home_dir().unwrap_or_else(|| PathBuf::from("/tmp")).join(".docent")
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  #[test]
  fn defaults_follow_the_chunking_policy() {
    let settings = Settings::default();
    assert_eq!(settings.chunk_size, 1000);
    assert_eq!(settings.chunk_overlap, 100);
    assert_eq!(settings.top_k, 4);
    assert!(settings.validate().is_ok());
  }

  #[test]
  fn partial_yaml_keeps_defaults() {
    let settings = Settings::from_yaml("top_k: 6\nmemory: durable\n").unwrap();
    assert_eq!(settings.top_k, 6);
    assert_eq!(settings.memory, MemoryBackend::Durable);
    assert_eq!(settings.chat_model, "llama3.1");
  }

  #[test]
  fn overlap_must_be_smaller_than_chunk() {
    let settings = Settings { chunk_size: 100, chunk_overlap: 100, ..Settings::default() };
    let err = settings.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_overlap"));
  }

  #[test]
  fn derived_directories_hang_off_root() {
    let settings = Settings { root: PathBuf::from("/srv/docent"), ..Settings::default() };
    assert_eq!(settings.index_dir(), PathBuf::from("/srv/docent/index"));
    assert_eq!(settings.sessions_dir(), PathBuf::from("/srv/docent/sessions"));
  }

  #[test]
  #[serial]
  fn env_overrides_file_values() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, "chat_model: mistral\n").unwrap();

    std::env::set_var("DOCENT_CHAT_MODEL", "qwen2.5");
    std::env::set_var(ROOT_ENV, dir.path());
    let settings = Settings::load(Some(path.as_path())).unwrap();
    std::env::remove_var("DOCENT_CHAT_MODEL");
    std::env::remove_var(ROOT_ENV);

    assert_eq!(settings.chat_model, "qwen2.5");
    assert_eq!(settings.root, dir.path());
  }

  #[test]
  fn malformed_yaml_is_a_config_error() {
    let err = Settings::from_yaml("top_k: [not a number").unwrap_err();
    assert!(matches!(err, DocentError::Config(_)));
  }
}
