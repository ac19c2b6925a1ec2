use std::sync::Arc;

use super::prompts::{answer_system_message, NO_CONTEXT_ANSWER};
use crate::error::Result;
use crate::index::VectorIndex;
use crate::memory::ConversationTurn;
use crate::services::llm::{ChatMessage, GenerationParams, LanguageModel};

/// Answers a standalone question from the chunks the index retrieves for it
pub struct Answerer {
  llm: Arc<dyn LanguageModel>,
  index: Arc<VectorIndex>,
  params: GenerationParams,
  top_k: usize,
  strict_empty_context: bool,
}

impl Answerer {
  pub fn new(
    llm: Arc<dyn LanguageModel>,
    index: Arc<VectorIndex>,
    params: GenerationParams,
    top_k: usize,
  ) -> Self {
    Self { llm, index, params, top_k, strict_empty_context: true }
  }

  /// When off, the model is still asked even if retrieval finds nothing
  pub fn with_strict_empty_context(mut self, strict: bool) -> Self {
    self.strict_empty_context = strict;
    self
  }

  pub async fn answer(&self, question: &str, history: &[ConversationTurn]) -> Result<String> {
    let hits = self.index.search(question, self.top_k).await?;
    if hits.is_empty() && self.strict_empty_context {
      bentley::verbose!("Nothing retrieved for '{question}', answering without the model");
      return Ok(NO_CONTEXT_ANSWER.to_string());
    }

    let context = hits.iter().map(|hit| hit.chunk.text.as_str()).collect::<Vec<_>>().join("\n\n");
    bentley::verbose!("Answering with {} retrieved chunk(s)", hits.len());

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(answer_system_message(&context)));
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::human(question));

    self.llm.generate(&messages, &self.params).await
  }
}
