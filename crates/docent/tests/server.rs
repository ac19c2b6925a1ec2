mod common;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use bentley::daemon_logs::DaemonLogs;
use common::{embedder, settings_in, write_corpus, EchoModel};
use docent::runtime::Runtime;
use docent::server::routing::create_router;
use docent::server::AppState;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

async fn test_app(temp: &TempDir) -> Router {
  write_corpus(temp.path());
  let settings = settings_in(temp.path());
  let documents = settings.documents_dir.clone();

  let runtime = Runtime::with_services(settings.clone(), embedder(), Arc::new(EchoModel::default()))
    .await
    .unwrap();
  runtime.ingest(&documents).await.unwrap();

  let logs = DaemonLogs::new_with_silent(settings.server_logs_path(), true).unwrap();
  create_router(AppState { runtime: Arc::new(runtime), logs })
}

async fn call(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
  let response = app.clone().oneshot(request).await.unwrap();
  let status = response.status();
  let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap())
}

fn get(uri: &str) -> Request<Body> {
  Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post(uri: &str, body: Value) -> Request<Body> {
  Request::builder()
    .method("POST")
    .uri(uri)
    .header("content-type", "application/json")
    .body(Body::from(body.to_string()))
    .unwrap()
}

#[tokio::test]
async fn test_status_reports_the_index() {
  let temp = TempDir::new().unwrap();
  let app = test_app(&temp).await;

  let (status, body) = call(&app, get("/status")).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "healthy");
  assert_eq!(body["chunks"], 3);
  assert_eq!(body["embedding_model"], "hash-embedder");
  assert_eq!(body["chat_model"], "echo");
  assert!(body["transaction_id"].is_string());
  assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_message_then_history() {
  let temp = TempDir::new().unwrap();
  let app = test_app(&temp).await;

  let (status, body) =
    call(&app, post("/sessions/garage-1/messages", json!({ "message": "How do I pair a remote?" }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["session_id"], "garage-1");
  assert_eq!(body["reply"], "answer: How do I pair a remote?");
  assert_eq!(body["degraded"], false);

  let (status, body) = call(&app, get("/sessions/garage-1/history")).await;
  assert_eq!(status, StatusCode::OK);
  let turns = body["session"]["turns"].as_array().unwrap();
  assert_eq!(turns.len(), 2);
  assert_eq!(turns[0]["role"], "human");
  assert_eq!(turns[1]["role"], "assistant");

  let (_, body) = call(&app, get("/sessions")).await;
  assert_eq!(body["sessions"], json!(["garage-1"]));
}

#[tokio::test]
async fn test_blank_message_is_rejected() {
  let temp = TempDir::new().unwrap();
  let app = test_app(&temp).await;

  let (status, body) = call(&app, post("/sessions/s/messages", json!({ "message": "   " }))).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
  assert_eq!(body["errors"][0]["key"], "empty_message");
}

#[tokio::test]
async fn test_search_and_sources() {
  let temp = TempDir::new().unwrap();
  let app = test_app(&temp).await;

  let (status, body) = call(&app, post("/search", json!({ "query": "safety sensors", "limit": 2 }))).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["hits"].as_array().unwrap().len(), 2);

  let (status, body) = call(&app, get("/sources")).await;
  assert_eq!(status, StatusCode::OK);
  let sources = body["sources"].as_array().unwrap();
  assert_eq!(sources.len(), 3);
  assert!(sources.iter().any(|s| s["product_type"] == "opener-x200"));
}

#[tokio::test]
async fn test_requests_are_logged() {
  let temp = TempDir::new().unwrap();
  let app = test_app(&temp).await;

  call(&app, get("/version")).await;
  let (status, body) = call(&app, get("/logs?level=info")).await;
  assert_eq!(status, StatusCode::OK);

  let logs = body["logs"].as_array().unwrap();
  assert!(logs.iter().any(|entry| {
    entry["context"]["path"] == "/version" && entry["context"]["status_code"] == 200
  }));
}
