//! Chat-style language model access

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{DocentError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
  System,
  Human,
  Assistant,
}

impl ChatRole {
  fn as_ollama(self) -> &'static str {
    match self {
      ChatRole::System => "system",
      ChatRole::Human => "user",
      ChatRole::Assistant => "assistant",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
  pub role: ChatRole,
  pub content: String,
}

impl ChatMessage {
  pub fn system(content: impl Into<String>) -> Self {
    Self { role: ChatRole::System, content: content.into() }
  }

  pub fn human(content: impl Into<String>) -> Self {
    Self { role: ChatRole::Human, content: content.into() }
  }

  pub fn assistant(content: impl Into<String>) -> Self {
    Self { role: ChatRole::Assistant, content: content.into() }
  }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
  pub temperature: f32,
}

impl Default for GenerationParams {
  fn default() -> Self {
    Self { temperature: 0.5 }
  }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LanguageModel: Send + Sync {
  fn model_name(&self) -> String;

  /// Run one completion over `messages` and return the reply text
  async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String>;
}

#[derive(Serialize)]
struct OllamaMessage<'a> {
  role: &'static str,
  content: &'a str,
}

#[derive(Serialize)]
struct OllamaOptions {
  temperature: f32,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
  model: &'a str,
  messages: Vec<OllamaMessage<'a>>,
  stream: bool,
  options: OllamaOptions,
}

#[derive(Deserialize)]
struct ChatResponse {
  message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
  #[serde(default)]
  content: String,
}

pub struct OllamaChat {
  client: Client,
  base_url: String,
  model: String,
  timeout_secs: u64,
}

impl OllamaChat {
  pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
    Ok(Self {
      client: super::http_client(DocentError::LanguageModelService)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
      timeout_secs,
    })
  }
}

#[async_trait]
impl LanguageModel for OllamaChat {
  fn model_name(&self) -> String {
    self.model.clone()
  }

  async fn generate(&self, messages: &[ChatMessage], params: &GenerationParams) -> Result<String> {
    let request = ChatRequest {
      model: &self.model,
      messages: messages
        .iter()
        .map(|m| OllamaMessage { role: m.role.as_ollama(), content: &m.content })
        .collect(),
      stream: false,
      options: OllamaOptions { temperature: params.temperature },
    };

    let url = format!("{}/api/chat", self.base_url);
    let response: ChatResponse = super::post_json(
      &self.client,
      &url,
      &request,
      self.timeout_secs,
      "language model",
      DocentError::LanguageModelService,
    )
    .await?;

    Ok(response.message.content)
  }
}
