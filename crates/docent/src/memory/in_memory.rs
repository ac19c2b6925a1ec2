use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{ConversationTurn, Role, Session, SessionStore};
use crate::error::Result;

/// Process-lifetime history; lost on exit
#[derive(Default)]
pub struct InMemorySessionStore {
  sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
  async fn get_history(&self, session_id: &str) -> Result<Session> {
    if let Some(session) = self.sessions.read().await.get(session_id) {
      return Ok(session.clone());
    }

    let mut sessions = self.sessions.write().await;
    Ok(sessions.entry(session_id.to_string()).or_insert_with(|| Session::empty(session_id)).clone())
  }

  async fn append(&self, session_id: &str, role: Role, content: &str) -> Result<()> {
    let mut sessions = self.sessions.write().await;
    sessions
      .entry(session_id.to_string())
      .or_insert_with(|| Session::empty(session_id))
      .turns
      .push(ConversationTurn::new(role, content));
    Ok(())
  }

  async fn list_sessions(&self) -> Result<Vec<String>> {
    let mut ids: Vec<String> = self.sessions.read().await.keys().cloned().collect();
    ids.sort();
    Ok(ids)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::Arc;

  #[tokio::test]
  async fn unknown_session_is_created_empty() {
    let store = InMemorySessionStore::new();
    let session = store.get_history("new-user").await.unwrap();

    assert_eq!(session.session_id, "new-user");
    assert!(session.turns.is_empty());
    assert_eq!(store.list_sessions().await.unwrap(), vec!["new-user"]);
  }

  #[tokio::test]
  async fn sessions_do_not_share_turns() {
    let store = InMemorySessionStore::new();
    store.append("a", Role::Human, "first").await.unwrap();
    store.append("b", Role::Human, "second").await.unwrap();

    assert_eq!(store.get_history("a").await.unwrap().turns.len(), 1);
    assert_eq!(store.get_history("b").await.unwrap().turns[0].content, "second");
  }

  #[tokio::test]
  async fn concurrent_appends_to_different_sessions_all_land() {
    let store = Arc::new(InMemorySessionStore::new());
    let mut handles = Vec::new();
    for n in 0..8 {
      let store = store.clone();
      handles.push(tokio::spawn(async move {
        for i in 0..10 {
          store.append(&format!("s{n}"), Role::Human, &i.to_string()).await.unwrap();
        }
      }));
    }
    for handle in handles {
      handle.await.unwrap();
    }

    for n in 0..8 {
      let turns = store.get_history(&format!("s{n}")).await.unwrap().turns;
      let contents: Vec<_> = turns.iter().map(|t| t.content.as_str()).collect();
      assert_eq!(contents, (0..10).map(|i| i.to_string()).collect::<Vec<_>>());
    }
  }
}
