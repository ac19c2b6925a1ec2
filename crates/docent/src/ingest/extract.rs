//! Page text extraction
//!
//! PDF text comes from poppler's `pdftotext`, which writes a form feed after
//! every page. Plain-text files are treated as a single page.

use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

use crate::error::{DocentError, Result};

const PAGE_BREAK: char = '\u{c}';

/// Turns one document into its pages' text, in page order
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PageExtractor: Send + Sync {
  /// Whether this extractor handles `path`
  fn supports(&self, path: &Path) -> bool;

  async fn extract_pages(&self, path: &Path) -> Result<Vec<String>>;
}

/// Runs the `pdftotext` system binary
pub struct PdftotextExtractor {
  binary: String,
}

impl Default for PdftotextExtractor {
  fn default() -> Self {
    Self { binary: "pdftotext".to_string() }
  }
}

impl PdftotextExtractor {
  pub fn with_binary(binary: impl Into<String>) -> Self {
    Self { binary: binary.into() }
  }
}

#[async_trait]
impl PageExtractor for PdftotextExtractor {
  fn supports(&self, path: &Path) -> bool {
    has_extension(path, &["pdf"])
  }

  async fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
    let output = Command::new(&self.binary)
      .arg("-layout")
      .arg("-enc")
      .arg("UTF-8")
      .arg(path)
      .arg("-")
      .output()
      .await
      .map_err(|e| ingestion_error(path, format!("could not run {} (is poppler installed?): {e}", self.binary)))?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(ingestion_error(path, format!("{} failed: {}", self.binary, stderr.trim())));
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
  }
}

/// Reads `.txt` and `.md` files as one page each
#[derive(Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl PageExtractor for PlainTextExtractor {
  fn supports(&self, path: &Path) -> bool {
    has_extension(path, &["txt", "md"])
  }

  async fn extract_pages(&self, path: &Path) -> Result<Vec<String>> {
    let text = tokio::fs::read_to_string(path).await.map_err(|e| ingestion_error(path, e.to_string()))?;
    Ok(vec![text])
  }
}

/// Split `pdftotext` output on form feeds, dropping the empty tail after the last page
pub fn split_pages(raw: &str) -> Vec<String> {
  let mut pages: Vec<String> = raw.split(PAGE_BREAK).map(str::to_string).collect();
  while pages.last().is_some_and(|p| p.trim().is_empty()) {
    pages.pop();
  }
  pages
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
  path
    .extension()
    .and_then(|ext| ext.to_str())
    .is_some_and(|ext| extensions.iter().any(|wanted| ext.eq_ignore_ascii_case(wanted)))
}

fn ingestion_error(path: &Path, message: String) -> DocentError {
  DocentError::Ingestion { path: path.display().to_string(), message }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn split_pages_keeps_inner_blank_pages() {
    let pages = split_pages("one\u{c}\u{c}three\u{c}");
    assert_eq!(pages, vec!["one", "", "three"]);
  }

  #[test]
  fn extension_matching_ignores_case() {
    let pdf = PdftotextExtractor::default();
    assert!(pdf.supports(Path::new("manuals/Opener.PDF")));
    assert!(!pdf.supports(Path::new("manuals/readme.txt")));
    assert!(PlainTextExtractor.supports(Path::new("notes.md")));
  }

  #[tokio::test]
  async fn plain_text_is_one_page() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("guide.txt");
    std::fs::write(&path, "Hold the button for six seconds.").unwrap();

    let pages = PlainTextExtractor.extract_pages(&path).await.unwrap();
    assert_eq!(pages, vec!["Hold the button for six seconds."]);
  }

  #[tokio::test]
  async fn missing_binary_is_an_ingestion_error() {
    let extractor = PdftotextExtractor::with_binary("definitely-not-a-real-pdftotext");
    let err = extractor.extract_pages(Path::new("manual.pdf")).await.unwrap_err();
    assert!(matches!(err, DocentError::Ingestion { .. }));
  }
}
