//! Recursive character splitter
//!
//! Tries paragraph breaks first, then line breaks, sentence ends and spaces,
//! and only falls back to fixed windows when a span has none of them. A
//! separator stays attached to the end of the piece it closes, so a sentence
//! keeps its full stop even when a chunk boundary falls right after it. All
//! lengths are in characters, not bytes.

use std::collections::VecDeque;

const DEFAULT_SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
  chunk_size: usize,
  chunk_overlap: usize,
  separators: Vec<String>,
}

impl Default for TextSplitter {
  fn default() -> Self {
    Self::new(1000, 100)
  }
}

impl TextSplitter {
  /// `chunk_overlap` is clamped below `chunk_size`
  pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
    let chunk_size = chunk_size.max(1);
    Self {
      chunk_size,
      chunk_overlap: chunk_overlap.min(chunk_size - 1),
      separators: DEFAULT_SEPARATORS.iter().map(|s| s.to_string()).collect(),
    }
  }

  pub fn chunk_overlap(&self) -> usize {
    self.chunk_overlap
  }

  /// Split `text` into chunks of at most `chunk_size` characters
  pub fn split(&self, text: &str) -> Vec<String> {
    self
      .split_with(text, &self.separators)
      .into_iter()
      .filter(|chunk| !chunk.trim().is_empty())
      .collect()
  }

  fn split_with(&self, text: &str, separators: &[String]) -> Vec<String> {
    if char_len(text) <= self.chunk_size {
      return vec![text.trim().to_string()];
    }

    let Some(position) = separators.iter().position(|s| s.is_empty() || text.contains(s.as_str()))
    else {
      return self.windows(text);
    };

    let separator = separators[position].as_str();
    if separator.is_empty() {
      return self.windows(text);
    }
    let finer = &separators[position + 1..];

    let mut chunks = Vec::new();
    let mut pending: Vec<&str> = Vec::new();
    for piece in text.split_inclusive(separator) {
      if char_len(piece) <= self.chunk_size {
        pending.push(piece);
        continue;
      }

      if !pending.is_empty() {
        chunks.extend(self.merge(&pending));
        pending.clear();
      }
      chunks.extend(self.split_with(piece, finer));
    }

    if !pending.is_empty() {
      chunks.extend(self.merge(&pending));
    }
    chunks
  }

  /// Greedily concatenate small pieces back into chunks, carrying up to
  /// `chunk_overlap` characters of trailing pieces into the next chunk
  fn merge(&self, pieces: &[&str]) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current: VecDeque<&str> = VecDeque::new();
    let mut total = 0usize;

    for &piece in pieces {
      let len = char_len(piece);

      if total + len > self.chunk_size && !current.is_empty() {
        push_joined(&mut chunks, &current);

        while total > self.chunk_overlap || (total + len > self.chunk_size && !current.is_empty()) {
          let Some(removed) = current.pop_front() else {
            break;
          };
          total -= char_len(removed);
        }
      }

      current.push_back(piece);
      total += len;
    }

    push_joined(&mut chunks, &current);
    chunks
  }

  /// Fixed windows of `chunk_size` with stride `chunk_size - chunk_overlap`
  fn windows(&self, text: &str) -> Vec<String> {
    let offsets: Vec<usize> =
      text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len())).collect();
    let count = offsets.len() - 1;
    let stride = self.chunk_size - self.chunk_overlap;

    let mut chunks = Vec::new();
    let mut start = 0;
    loop {
      let end = (start + self.chunk_size).min(count);
      chunks.push(text[offsets[start]..offsets[end]].to_string());
      if end == count {
        break;
      }
      start += stride;
    }
    chunks
  }
}

fn push_joined(chunks: &mut Vec<String>, current: &VecDeque<&str>) {
  let joined: String = current.iter().copied().collect();
  let trimmed = joined.trim();
  if !trimmed.is_empty() {
    chunks.push(trimmed.to_string());
  }
}

fn char_len(text: &str) -> usize {
  text.chars().count()
}
