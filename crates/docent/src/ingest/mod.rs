//! Document ingestion: pages in, bounded overlapping chunks out
//!
//! Ingestion never aborts the pipeline. An unreadable source or a corpus with
//! nothing parsable produces an empty chunk list and a warning; one broken file
//! is skipped while the rest still load.

pub mod extract;
pub mod splitter;

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::{Settings, TaxonomyRule};
use crate::models::{Chunk, ChunkMetadata};
use extract::{PageExtractor, PdftotextExtractor, PlainTextExtractor};
use splitter::TextSplitter;

/// Text of one page, as handed over by an extractor
#[derive(Debug, Clone)]
pub struct Page {
  pub text: String,
  pub source_path: PathBuf,
  /// 1-based
  pub page_number: usize,
}

pub struct DocumentLoader {
  extractors: Vec<Box<dyn PageExtractor>>,
  splitter: TextSplitter,
  taxonomy: TaxonomyRule,
}

impl DocumentLoader {
  pub fn new(
    extractors: Vec<Box<dyn PageExtractor>>,
    splitter: TextSplitter,
    taxonomy: TaxonomyRule,
  ) -> Self {
    Self { extractors, splitter, taxonomy }
  }

  /// Loader with the PDF and plain-text extractors and the configured chunking
  pub fn from_settings(settings: &Settings) -> Self {
    Self::new(
      vec![Box::new(PdftotextExtractor::default()), Box::new(PlainTextExtractor)],
      TextSplitter::new(settings.chunk_size, settings.chunk_overlap),
      settings.taxonomy.clone(),
    )
  }

  /// Load every supported document under `source` and split it into chunks
  pub async fn load_and_split(&self, source: &Path) -> Vec<Chunk> {
    bentley::info!("Loading documents from {}", source.display());

    let files = self.collect_files(source);
    if files.is_empty() {
      bentley::warn!("No readable documents found at {}", source.display());
      return Vec::new();
    }

    let mut chunks = Vec::new();
    for file in &files {
      match self.load_file(file).await {
        Ok(pages) => chunks.extend(self.chunk_pages(pages)),
        Err(e) => bentley::warn!("Skipping {}: {e}", file.display()),
      }
    }

    if chunks.is_empty() {
      bentley::warn!("{} document(s) found but none produced any text", files.len());
    } else {
      bentley::success!("Split {} document(s) into {} chunks", files.len(), chunks.len());
    }
    chunks
  }

  /// Split already-extracted pages into chunks, page by page
  pub fn chunk_pages(&self, pages: impl IntoIterator<Item = Page>) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    for page in pages {
      let (product_type, doc_type) = classify(&page.source_path, &self.taxonomy);
      for text in self.splitter.split(&page.text) {
        let metadata = ChunkMetadata {
          source_path: page.source_path.display().to_string(),
          page_number: page.page_number,
          product_type: product_type.clone(),
          doc_type: doc_type.clone(),
        };
        chunks.push(Chunk::new(text, metadata));
      }
    }
    chunks
  }

  async fn load_file(&self, path: &Path) -> crate::Result<Vec<Page>> {
    let extractor = self
      .extractors
      .iter()
      .find(|e| e.supports(path))
      .ok_or_else(|| crate::DocentError::Ingestion {
        path: path.display().to_string(),
        message: "no extractor supports this file type".to_string(),
      })?;

    let pages = extractor.extract_pages(path).await?;
    bentley::verbose!("{}: {} page(s)", path.display(), pages.len());

    Ok(
      pages
        .into_iter()
        .enumerate()
        .map(|(i, text)| Page { text, source_path: path.to_path_buf(), page_number: i + 1 })
        .collect(),
    )
  }

  fn collect_files(&self, source: &Path) -> Vec<PathBuf> {
    if source.is_file() {
      return if self.supported(source) { vec![source.to_path_buf()] } else { Vec::new() };
    }

    let mut files: Vec<PathBuf> = WalkDir::new(source)
      .into_iter()
      .filter_map(|entry| match entry {
        Ok(entry) => Some(entry),
        Err(e) => {
          bentley::warn!("Cannot read {}: {e}", source.display());
          None
        }
      })
      .filter(|entry| entry.file_type().is_file() && self.supported(entry.path()))
      .map(|entry| entry.into_path())
      .collect();

    files.sort();
    files
  }

  fn supported(&self, path: &Path) -> bool {
    self.extractors.iter().any(|e| e.supports(path))
  }
}

/// Read `(product_type, doc_type)` from the ancestors of `path`
pub fn classify(path: &Path, rule: &TaxonomyRule) -> (Option<String>, Option<String>) {
  if !rule.enabled {
    return (None, None);
  }
  (ancestor_name(path, rule.product_depth), ancestor_name(path, rule.doc_type_depth))
}

fn ancestor_name(path: &Path, depth: usize) -> Option<String> {
  let dir = path.ancestors().nth(depth)?;
  dir.file_name().map(|name| name.to_string_lossy().into_owned())
}
