//! Per-session conversation history
//!
//! Sessions are created on first use, only ever appended to, and never deleted
//! here. Ordering is append order; timestamps are informational.

pub mod in_memory;
pub mod jsonl;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub use in_memory::InMemorySessionStore;
pub use jsonl::JsonlSessionStore;

use crate::config::{MemoryBackend, Settings};
use crate::error::Result;
use crate::services::llm::ChatMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
  Human,
  Assistant,
}

impl fmt::Display for Role {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Role::Human => write!(f, "human"),
      Role::Assistant => write!(f, "assistant"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ConversationTurn {
  pub role: Role,
  pub content: String,
  pub timestamp: DateTime<Utc>,
}

impl ConversationTurn {
  pub fn new(role: Role, content: impl Into<String>) -> Self {
    Self { role, content: content.into(), timestamp: Utc::now() }
  }
}

impl From<&ConversationTurn> for ChatMessage {
  fn from(turn: &ConversationTurn) -> Self {
    match turn.role {
      Role::Human => ChatMessage::human(turn.content.clone()),
      Role::Assistant => ChatMessage::assistant(turn.content.clone()),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Session {
  pub session_id: String,
  pub turns: Vec<ConversationTurn>,
}

impl Session {
  pub fn empty(session_id: &str) -> Self {
    Self { session_id: session_id.to_string(), turns: Vec::new() }
  }

  pub fn chat_messages(&self) -> Vec<ChatMessage> {
    self.turns.iter().map(ChatMessage::from).collect()
  }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
  /// All turns of `session_id` in append order; unknown ids yield an empty session
  async fn get_history(&self, session_id: &str) -> Result<Session>;

  /// Record one turn at the end of `session_id`
  async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<()>;

  /// Ids of every session that has been touched, sorted
  async fn list_sessions(&self) -> Result<Vec<String>>;
}

/// One async mutex per session id, created on first use
#[derive(Default)]
pub struct SessionLocks {
  locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl SessionLocks {
  /// Wait for exclusive access to `session_id`; other sessions are unaffected
  pub async fn acquire(&self, session_id: &str) -> OwnedMutexGuard<()> {
    let lock = {
      let mut locks = self.locks.lock().await;
      locks.entry(session_id.to_string()).or_default().clone()
    };
    lock.lock_owned().await
  }
}

/// Build the backend selected by `settings.memory`
pub fn from_settings(settings: &Settings) -> Result<Arc<dyn SessionStore>> {
  match settings.memory {
    MemoryBackend::InMemory => Ok(Arc::new(InMemorySessionStore::new())),
    MemoryBackend::Durable => Ok(Arc::new(JsonlSessionStore::new(settings.sessions_dir())?)),
  }
}
