//! The conversation orchestrator
//!
//! One turn: read history, rewrite the message, answer it, record both sides.
//! Turns of one session are serialised; different sessions run concurrently.

use async_trait::async_trait;
use std::sync::Arc;

use super::answerer::Answerer;
use super::contextualizer::Contextualizer;
use crate::error::Result;
use crate::index::VectorIndex;
use crate::memory::{Role, Session, SessionLocks, SessionStore};
use crate::models::SearchHit;

/// Shown to the user when the model or retrieval step fails
pub const APOLOGY: &str = "Ran into an issue. Please try again.";

/// What a turn produced
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
  pub message: String,
  /// Cause of a degraded turn; `message` is then the apology
  pub failure: Option<String>,
}

/// Anything that can answer a user message within a session
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Responder: Send + Sync {
  async fn respond(&self, session_id: &str, message: &str) -> Result<String>;
}

pub struct Conversation {
  store: Arc<dyn SessionStore>,
  index: Arc<VectorIndex>,
  contextualizer: Contextualizer,
  answerer: Answerer,
  locks: SessionLocks,
}

impl Conversation {
  pub fn new(
    store: Arc<dyn SessionStore>,
    index: Arc<VectorIndex>,
    contextualizer: Contextualizer,
    answerer: Answerer,
  ) -> Self {
    Self { store, index, contextualizer, answerer, locks: SessionLocks::default() }
  }

  /// Run one turn and return the assistant's message
  pub async fn turn(&self, session_id: &str, user_message: &str) -> Result<String> {
    Ok(self.reply(session_id, user_message).await?.message)
  }

  /// Like [`turn`](Self::turn), but reports why a turn degraded to the apology.
  ///
  /// A failed contextualize or answer step still records the user's message
  /// but not the apology. Session store failures are returned as errors.
  pub async fn reply(&self, session_id: &str, user_message: &str) -> Result<Reply> {
    let _guard = self.locks.acquire(session_id).await;

    let history = self.store.get_history(session_id).await?;
    match self.generate(&history, user_message).await {
      Ok(answer) => {
        self.store.append(session_id, Role::Human, user_message).await?;
        self.store.append(session_id, Role::Assistant, &answer).await?;
        Ok(Reply { message: answer, failure: None })
      }
      Err(e) => {
        bentley::error!("Turn failed for session {session_id}: {e}");
        self.store.append(session_id, Role::Human, user_message).await?;
        Ok(Reply { message: APOLOGY.to_string(), failure: Some(e.to_string()) })
      }
    }
  }

  async fn generate(&self, history: &Session, user_message: &str) -> Result<String> {
    let question = self.contextualizer.contextualize(&history.turns, user_message).await?;
    self.answerer.answer(&question, &history.turns).await
  }

  pub async fn history(&self, session_id: &str) -> Result<Session> {
    self.store.get_history(session_id).await
  }

  pub async fn sessions(&self) -> Result<Vec<String>> {
    self.store.list_sessions().await
  }

  /// Raw retrieval, without the model
  pub async fn search(&self, query: &str, k: usize) -> Result<Vec<SearchHit>> {
    self.index.search(query, k).await
  }
}

#[async_trait]
impl Responder for Conversation {
  async fn respond(&self, session_id: &str, message: &str) -> Result<String> {
    self.turn(session_id, message).await
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::DocentError;
  use crate::memory::{InMemorySessionStore, MockSessionStore};
  use crate::models::{Chunk, ChunkMetadata};
  use crate::services::embeddings::MockEmbedder;
  use crate::services::llm::{ChatMessage, GenerationParams, LanguageModel, MockLanguageModel};
  use std::time::Duration;

  /// Replies to the last message after a pause, so overlapping turns interleave
  struct SlowModel;

  #[async_trait]
  impl LanguageModel for SlowModel {
    fn model_name(&self) -> String {
      "slow".to_string()
    }

    async fn generate(&self, messages: &[ChatMessage], _params: &GenerationParams) -> Result<String> {
      tokio::time::sleep(Duration::from_millis(20)).await;
      let last = messages.last().map(|m| m.content.clone()).unwrap_or_default();
      Ok(format!("reply to {last}"))
    }
  }

  async fn manual_index() -> Arc<VectorIndex> {
    let mut embedder = MockEmbedder::new();
    embedder.expect_model_name().return_const("len".to_string());
    embedder.expect_embed().returning(|t| Ok(vec![t.len() as f32]));
    embedder.expect_embed_batch().returning(|ts| Ok(ts.iter().map(|t| vec![t.len() as f32]).collect()));

    let index = VectorIndex::create(Arc::new(embedder)).await.unwrap();
    let metadata =
      ChunkMetadata { source_path: "x200.pdf".into(), page_number: 4, product_type: None, doc_type: None };
    index.add(vec![Chunk::new("Press and hold the learn button.", metadata)]).await.unwrap();
    Arc::new(index)
  }

  fn conversation(store: Arc<dyn SessionStore>, index: Arc<VectorIndex>, llm: MockLanguageModel) -> Conversation {
    let llm: Arc<dyn LanguageModel> = Arc::new(llm);
    Conversation::new(
      store,
      index.clone(),
      Contextualizer::new(llm.clone(), GenerationParams::default()),
      Answerer::new(llm, index, GenerationParams::default(), 4),
    )
  }

  #[tokio::test]
  async fn turns_append_human_then_assistant() {
    let store = Arc::new(InMemorySessionStore::new());
    let mut llm = MockLanguageModel::new();
    llm.expect_generate().returning(|messages, _| Ok(format!("reply to {}", messages.last().unwrap().content)));

    let conversation = conversation(store.clone(), manual_index().await, llm);
    for n in 0..3 {
      conversation.turn("s1", &format!("question {n}")).await.unwrap();
    }

    let turns = store.get_history("s1").await.unwrap().turns;
    assert_eq!(turns.len(), 6);
    for (i, turn) in turns.iter().enumerate() {
      let expected = if i % 2 == 0 { Role::Human } else { Role::Assistant };
      assert_eq!(turn.role, expected);
    }
    assert_eq!(turns[4].content, "question 2");
  }

  #[tokio::test]
  async fn failed_turn_records_only_the_user_message() {
    let store = Arc::new(InMemorySessionStore::new());
    let mut llm = MockLanguageModel::new();
    llm
      .expect_generate()
      .returning(|_, _| Err(DocentError::LanguageModelService("model not loaded".to_string())));

    let conversation = conversation(store.clone(), manual_index().await, llm);
    let reply = conversation.reply("s1", "How do I reset it?").await.unwrap();

    assert_eq!(reply.message, APOLOGY);
    assert!(reply.failure.unwrap().contains("model not loaded"));

    let turns = store.get_history("s1").await.unwrap().turns;
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].role, Role::Human);
  }

  #[tokio::test]
  async fn store_failure_fails_the_turn() {
    let mut store = MockSessionStore::new();
    store
      .expect_get_history()
      .returning(|_| Err(DocentError::SessionStore("disk full".to_string())));
    let mut llm = MockLanguageModel::new();
    llm.expect_generate().times(0);

    let conversation = conversation(Arc::new(store), manual_index().await, llm);
    let result = conversation.turn("s1", "hello").await;
    assert!(matches!(result, Err(DocentError::SessionStore(_))));
  }

  #[tokio::test]
  async fn follow_up_is_rewritten_before_retrieval() {
    let store = Arc::new(InMemorySessionStore::new());
    store.append("s1", Role::Human, "I have an X200.").await.unwrap();
    store.append("s1", Role::Assistant, "Great, how can I help?").await.unwrap();

    let mut llm = MockLanguageModel::new();
    let mut sequence = mockall::Sequence::new();
    llm
      .expect_generate()
      .times(1)
      .in_sequence(&mut sequence)
      .returning(|_, _| Ok("How do I reset the X200?".to_string()));
    llm
      .expect_generate()
      .times(1)
      .in_sequence(&mut sequence)
      .withf(|messages, _| {
        messages[0].content.contains("Press and hold the learn button.")
          && messages.last().map(|m| m.content.as_str()) == Some("How do I reset the X200?")
      })
      .returning(|_, _| Ok("Hold the learn button for six seconds.".to_string()));

    let conversation = conversation(store.clone(), manual_index().await, llm);
    let answer = conversation.turn("s1", "How do I reset it?").await.unwrap();

    assert_eq!(answer, "Hold the learn button for six seconds.");
    let turns = store.get_history("s1").await.unwrap().turns;
    assert_eq!(turns[2].content, "How do I reset it?");
  }

  #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
  async fn concurrent_turns_on_one_session_stay_paired() {
    let store = Arc::new(InMemorySessionStore::new());
    let index = manual_index().await;
    let llm: Arc<dyn LanguageModel> = Arc::new(SlowModel);
    let conversation = Arc::new(Conversation::new(
      store.clone(),
      index.clone(),
      Contextualizer::new(llm.clone(), GenerationParams::default()),
      Answerer::new(llm, index, GenerationParams::default(), 4),
    ));

    let handles: Vec<_> = (0..6)
      .map(|n| {
        let conversation = conversation.clone();
        tokio::spawn(async move { conversation.turn("shared", &format!("question {n}")).await })
      })
      .collect();
    for handle in handles {
      handle.await.unwrap().unwrap();
    }

    let turns = store.get_history("shared").await.unwrap().turns;
    assert_eq!(turns.len(), 12);
    for pair in turns.chunks(2) {
      assert_eq!(pair[0].role, Role::Human);
      assert_eq!(pair[1].role, Role::Assistant);
      assert!(
        pair[1].content.ends_with(&pair[0].content),
        "{:?} does not answer {:?}",
        pair[1].content,
        pair[0].content
      );
    }
  }
}
