//! REST API types with schemars annotations for OpenAPI generation

use axum::{http::StatusCode, response::Json};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::memory::Session;
use crate::models::{SearchHit, SourceSummary};

// Base Response Structure
// ======================

/// Base response object for all API endpoints
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct BaseResponse<T> {
  /// API versioning information
  pub versioning: VersionInfo,

  /// Transaction ID for logging correlation
  pub transaction_id: Uuid,

  #[serde(skip_serializing_if = "Vec::is_empty", default)]
  pub errors: Vec<ApiError>,

  #[serde(flatten)]
  pub data: T,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionInfo {
  pub latest: String,
  pub requested: String,
  pub resolved: String,
}

impl VersionInfo {
  fn current() -> Self {
    let version = env!("CARGO_PKG_VERSION");
    Self { latest: version.to_string(), requested: version.to_string(), resolved: version.to_string() }
  }
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiError {
  /// Error key, unique to the error source
  pub key: String,

  /// Human readable error message
  pub message: String,

  #[serde(default)]
  pub context: serde_json::Value,
}

impl<T> BaseResponse<T> {
  pub fn success(data: T, transaction_id: Uuid) -> Self {
    Self { versioning: VersionInfo::current(), transaction_id, errors: Vec::new(), data }
  }

  pub fn error(errors: Vec<ApiError>, transaction_id: Uuid) -> BaseResponse<()> {
    BaseResponse { versioning: VersionInfo::current(), transaction_id, errors, data: () }
  }
}

impl ApiError {
  pub fn new(key: &str, message: &str) -> Self {
    Self { key: key.to_string(), message: message.to_string(), context: serde_json::Value::Null }
  }
}

/// What every handler returns
pub type ApiResult<T> = Result<Json<BaseResponse<T>>, (StatusCode, Json<BaseResponse<()>>)>;

/// Error half of [`ApiResult`] with a single error entry
pub fn api_failure(
  status: StatusCode,
  key: &str,
  message: &str,
  transaction_id: Uuid,
) -> (StatusCode, Json<BaseResponse<()>>) {
  (status, Json(BaseResponse::<()>::error(vec![ApiError::new(key, message)], transaction_id)))
}

// Status Endpoints
// ================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct VersionResponse {
  pub version: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct StatusResponse {
  pub status: String,
  pub version: String,
  /// Chunks currently held by the index
  pub chunks: usize,
  pub dimension: usize,
  pub embedding_model: String,
  pub chat_model: String,
  pub memory: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SourcesResponse {
  pub sources: Vec<SourceSummary>,
}

// Logs Endpoint
// =============

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsQuery {
  /// Maximum number of entries, newest kept
  pub limit: Option<usize>,
  /// Level filter (verbose, info, success, warn, error, all)
  pub level: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct LogsResponse {
  pub logs: Vec<LogEntry>,
}

/// Individual log entry (re-exported from bentley)
pub type LogEntry = bentley::daemon_logs::LogEntry;

// Session Endpoints
// =================

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SendMessageRequest {
  pub message: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SendMessageResponse {
  pub session_id: String,
  pub reply: String,
  /// True when the reply is the apology for a failed turn
  pub degraded: bool,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct HistoryResponse {
  pub session: Session,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SessionsResponse {
  pub sessions: Vec<String>,
}

// Search Endpoint
// ===============

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchRequest {
  pub query: String,
  /// Defaults to the configured top_k
  #[serde(default)]
  pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct SearchResponse {
  pub hits: Vec<SearchHit>,
}
