//! Display formatting utilities for CLI output

use colored::*;

use crate::memory::{Role, Session};
use crate::models::{SearchHit, SourceSummary};

const PREVIEW_WIDTH: usize = 88;

pub fn user_prompt() -> String {
  format!("{} ", "User >>:".bold())
}

pub fn assistant_line(message: &str) -> String {
  format!("{} {message}\n", "Chatbot >>:".bold())
}

/// Wrap text to fit within a specified width
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();

  for paragraph in text.split('\n') {
    if paragraph.trim().is_empty() {
      lines.push(String::new());
      continue;
    }

    let mut current_line = String::new();
    for word in paragraph.split_whitespace() {
      if current_line.is_empty() {
        current_line = word.to_string();
      } else if current_line.chars().count() + 1 + word.chars().count() <= width {
        current_line.push(' ');
        current_line.push_str(word);
      } else {
        lines.push(std::mem::take(&mut current_line));
        current_line = word.to_string();
      }
    }

    if !current_line.is_empty() {
      lines.push(current_line);
    }
  }

  lines
}

/// Collapse whitespace and cut to `max` characters with an ellipsis
pub fn preview(text: &str, max: usize) -> String {
  let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
  if flat.chars().count() <= max {
    return flat;
  }
  let cut: String = flat.chars().take(max.saturating_sub(1)).collect();
  format!("{cut}…")
}

pub fn display_search_hit(rank: usize, hit: &SearchHit) {
  let meta = &hit.chunk.metadata;
  println!(
    "{} {} {} {}",
    format!("{rank}.").bold(),
    meta.source_path.cyan(),
    format!("p.{}", meta.page_number).yellow(),
    format!("(distance {:.4})", hit.distance).dimmed()
  );
  for line in wrap_text(&preview(&hit.chunk.text, PREVIEW_WIDTH * 3), PREVIEW_WIDTH) {
    println!("   {line}");
  }
  println!();
}

pub fn display_sources(sources: &[SourceSummary]) {
  for source in sources {
    let taxonomy = match (&source.product_type, &source.doc_type) {
      (Some(product), Some(doc)) => format!("{doc}/{product}"),
      (Some(product), None) => product.clone(),
      (None, Some(doc)) => doc.clone(),
      (None, None) => "-".to_string(),
    };
    println!(
      "  {} {} {}",
      source.source_path.cyan(),
      taxonomy.dimmed(),
      format!("{} pages, {} chunks", source.pages, source.chunks).yellow()
    );
  }
}

pub fn display_session(session: &Session) {
  for turn in &session.turns {
    let speaker = match turn.role {
      Role::Human => "User".green().bold(),
      Role::Assistant => "Chatbot".blue().bold(),
    };
    println!("{} {}", speaker, turn.timestamp.format("%Y-%m-%d %H:%M:%S").to_string().dimmed());
    for line in wrap_text(&turn.content, PREVIEW_WIDTH) {
      println!("  {line}");
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn wrap_text_respects_width() {
    let lines = wrap_text("press and hold the learn button until the light blinks", 20);
    assert!(lines.iter().all(|l| l.chars().count() <= 20));
    assert_eq!(lines.join(" "), "press and hold the learn button until the light blinks");
  }

  #[test]
  fn wrap_text_keeps_blank_lines() {
    assert_eq!(wrap_text("one\n\ntwo", 10), vec!["one", "", "two"]);
  }

  #[test]
  fn preview_flattens_and_truncates() {
    assert_eq!(preview("a\n  b\tc", 10), "a b c");
    assert_eq!(preview("abcdefghij", 5).chars().count(), 5);
  }
}
