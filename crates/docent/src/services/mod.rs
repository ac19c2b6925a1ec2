//! Clients for the external embedding and language model services

pub mod embeddings;
pub mod llm;

use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;
use tokio::time::timeout;

use crate::error::{DocentError, Result};

/// Build the shared HTTP client, mapping failure into the caller's error kind
pub(crate) fn http_client(to_error: fn(String) -> DocentError) -> Result<Client> {
  Client::builder().build().map_err(|e| to_error(format!("failed to create HTTP client: {e}")))
}

/// POST `body` as JSON and decode the JSON reply, bounded by `timeout_secs`
pub(crate) async fn post_json<B, R>(
  client: &Client,
  url: &str,
  body: &B,
  timeout_secs: u64,
  service: &'static str,
  to_error: fn(String) -> DocentError,
) -> Result<R>
where
  B: Serialize + ?Sized,
  R: DeserializeOwned,
{
  let request = async {
    let response =
      client.post(url).json(body).send().await.map_err(|e| to_error(e.to_string()))?;

    let status = response.status();
    if !status.is_success() {
      let error_text = response.text().await.unwrap_or_default();
      return Err(to_error(format!("{url} returned {status}: {}", error_text.trim())));
    }

    response.json::<R>().await.map_err(|e| to_error(format!("malformed response: {e}")))
  };

  timeout(Duration::from_secs(timeout_secs), request)
    .await
    .map_err(|_| DocentError::Timeout { service, seconds: timeout_secs })?
}
