use std::sync::Arc;

use super::prompts::CONTEXTUALIZE_INSTRUCTION;
use crate::error::Result;
use crate::memory::ConversationTurn;
use crate::services::llm::{ChatMessage, GenerationParams, LanguageModel};

/// Rewrites a follow-up question so it stands on its own
pub struct Contextualizer {
  llm: Arc<dyn LanguageModel>,
  params: GenerationParams,
}

impl Contextualizer {
  pub fn new(llm: Arc<dyn LanguageModel>, params: GenerationParams) -> Self {
    Self { llm, params }
  }

  /// Standalone form of `message`. Without history the message is returned
  /// as-is and no model call is made.
  pub async fn contextualize(&self, history: &[ConversationTurn], message: &str) -> Result<String> {
    if history.is_empty() {
      return Ok(message.to_string());
    }

    let mut messages = Vec::with_capacity(history.len() + 2);
    messages.push(ChatMessage::system(CONTEXTUALIZE_INSTRUCTION));
    messages.extend(history.iter().map(ChatMessage::from));
    messages.push(ChatMessage::human(message));

    let rewritten = self.llm.generate(&messages, &self.params).await?;
    let rewritten = rewritten.trim();
    if rewritten.is_empty() {
      return Ok(message.to_string());
    }

    bentley::verbose!("Standalone question: {rewritten}");
    Ok(rewritten.to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::DocentError;
  use crate::memory::Role;
  use crate::services::llm::{ChatRole, MockLanguageModel};

  fn history() -> Vec<ConversationTurn> {
    vec![
      ConversationTurn::new(Role::Human, "How do I program a remote for the X200?"),
      ConversationTurn::new(Role::Assistant, "Press the learn button, then the remote button."),
    ]
  }

  #[tokio::test]
  async fn empty_history_skips_the_model() {
    let mut llm = MockLanguageModel::new();
    llm.expect_generate().times(0);

    let contextualizer = Contextualizer::new(Arc::new(llm), GenerationParams::default());
    let question = contextualizer.contextualize(&[], "What is the warranty?").await.unwrap();
    assert_eq!(question, "What is the warranty?");
  }

  #[tokio::test]
  async fn history_is_sent_between_instruction_and_question() {
    let mut llm = MockLanguageModel::new();
    llm
      .expect_generate()
      .withf(|messages, _| {
        messages.len() == 4
          && messages[0] == ChatMessage::system(CONTEXTUALIZE_INSTRUCTION)
          && messages[1].role == ChatRole::Human
          && messages[2].role == ChatRole::Assistant
          && messages[3] == ChatMessage::human("And for a second remote?")
      })
      .times(1)
      .returning(|_, _| Ok("  How do I program a second remote for the X200?\n".to_string()));

    let contextualizer = Contextualizer::new(Arc::new(llm), GenerationParams::default());
    let question = contextualizer.contextualize(&history(), "And for a second remote?").await.unwrap();
    assert_eq!(question, "How do I program a second remote for the X200?");
  }

  #[tokio::test]
  async fn blank_rewrite_falls_back_to_the_message() {
    let mut llm = MockLanguageModel::new();
    llm.expect_generate().returning(|_, _| Ok("   ".to_string()));

    let contextualizer = Contextualizer::new(Arc::new(llm), GenerationParams::default());
    let question = contextualizer.contextualize(&history(), "And the light?").await.unwrap();
    assert_eq!(question, "And the light?");
  }

  #[tokio::test]
  async fn model_errors_propagate() {
    let mut llm = MockLanguageModel::new();
    llm
      .expect_generate()
      .times(1)
      .returning(|_, _| Err(DocentError::LanguageModelService("unreachable".to_string())));

    let contextualizer = Contextualizer::new(Arc::new(llm), GenerationParams::default());
    assert!(contextualizer.contextualize(&history(), "And the light?").await.is_err());
  }
}
