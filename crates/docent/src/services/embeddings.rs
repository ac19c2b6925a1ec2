//! Text embeddings
//!
//! The index only ever talks to [`Embedder`]; [`OllamaEmbedder`] is the
//! production implementation backed by Ollama's `/api/embed`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{DocentError, Result};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Embedder: Send + Sync {
  /// Name recorded alongside a persisted index
  fn model_name(&self) -> String;

  /// One vector per input text, in input order
  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

  async fn embed(&self, text: &str) -> Result<Vec<f32>> {
    let mut vectors = self.embed_batch(&[text.to_string()]).await?;
    vectors
      .pop()
      .ok_or_else(|| DocentError::EmbeddingService("service returned no embedding".to_string()))
  }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
  model: &'a str,
  input: &'a [String],
}

#[derive(Deserialize)]
struct EmbedResponse {
  embeddings: Vec<Vec<f32>>,
}

pub struct OllamaEmbedder {
  client: Client,
  base_url: String,
  model: String,
  timeout_secs: u64,
}

impl OllamaEmbedder {
  pub fn new(base_url: &str, model: &str, timeout_secs: u64) -> Result<Self> {
    Ok(Self {
      client: super::http_client(DocentError::EmbeddingService)?,
      base_url: base_url.trim_end_matches('/').to_string(),
      model: model.to_string(),
      timeout_secs,
    })
  }
}

#[async_trait]
impl Embedder for OllamaEmbedder {
  fn model_name(&self) -> String {
    self.model.clone()
  }

  async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
    if texts.is_empty() {
      return Ok(Vec::new());
    }

    let url = format!("{}/api/embed", self.base_url);
    let request = EmbedRequest { model: &self.model, input: texts };
    let response: EmbedResponse = super::post_json(
      &self.client,
      &url,
      &request,
      self.timeout_secs,
      "embedding",
      DocentError::EmbeddingService,
    )
    .await?;

    if response.embeddings.len() != texts.len() {
      return Err(DocentError::EmbeddingService(format!(
        "asked for {} embeddings, received {}",
        texts.len(),
        response.embeddings.len()
      )));
    }

    bentley::verbose!("Embedded {} text(s) with {}", texts.len(), self.model);
    Ok(response.embeddings)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;
  use std::time::Duration;
  use wiremock::matchers::{body_partial_json, method, path};
  use wiremock::{Mock, MockServer, ResponseTemplate};

  #[tokio::test]
  async fn test_embed_batch_posts_model_and_inputs() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embed"))
      .and(body_partial_json(json!({ "model": "nomic-embed-text", "input": ["a", "b"] })))
      .respond_with(
        ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[1.0, 0.0], [0.0, 1.0]] })),
      )
      .expect(1)
      .mount(&mock_server)
      .await;

    let embedder = OllamaEmbedder::new(&mock_server.uri(), "nomic-embed-text", 5).unwrap();
    let vectors = embedder.embed_batch(&["a".to_string(), "b".to_string()]).await.unwrap();

    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
  }

  #[tokio::test]
  async fn test_embed_single_text() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embed"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[0.5, 0.5, 0.5]] })))
      .mount(&mock_server)
      .await;

    let embedder = OllamaEmbedder::new(&mock_server.uri(), "nomic-embed-text", 5).unwrap();
    assert_eq!(embedder.embed("hello world").await.unwrap().len(), 3);
  }

  #[tokio::test]
  async fn test_server_error_is_an_embedding_error() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embed"))
      .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
      .mount(&mock_server)
      .await;

    let embedder = OllamaEmbedder::new(&mock_server.uri(), "missing", 5).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();

    assert!(matches!(err, DocentError::EmbeddingService(ref m) if m.contains("model not found")));
  }

  #[tokio::test]
  async fn test_count_mismatch_is_rejected() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embed"))
      .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "embeddings": [[1.0]] })))
      .mount(&mock_server)
      .await;

    let embedder = OllamaEmbedder::new(&mock_server.uri(), "nomic-embed-text", 5).unwrap();
    let result = embedder.embed_batch(&["a".to_string(), "b".to_string()]).await;
    assert!(matches!(result, Err(DocentError::EmbeddingService(_))));
  }

  #[tokio::test]
  async fn test_slow_service_times_out() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
      .and(path("/api/embed"))
      .respond_with(
        ResponseTemplate::new(200)
          .set_body_json(json!({ "embeddings": [[1.0]] }))
          .set_delay(Duration::from_secs(3)),
      )
      .mount(&mock_server)
      .await;

    let embedder = OllamaEmbedder::new(&mock_server.uri(), "nomic-embed-text", 1).unwrap();
    let err = embedder.embed("hello").await.unwrap_err();
    assert!(matches!(err, DocentError::Timeout { service: "embedding", seconds: 1 }));
  }

  #[tokio::test]
  async fn test_empty_batch_makes_no_request() {
    let embedder = OllamaEmbedder::new("http://127.0.0.1:9", "nomic-embed-text", 1).unwrap();
    assert!(embedder.embed_batch(&[]).await.unwrap().is_empty());
  }
}
