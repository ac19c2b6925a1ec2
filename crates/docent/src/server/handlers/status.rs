//! Status, version and index summary handlers

use axum::{
  extract::{Extension, State},
  response::Json,
};
use uuid::Uuid;

use crate::config::MemoryBackend;
use crate::server::{
  middleware::RequestContext,
  types::{ApiResult, BaseResponse, SourcesResponse, StatusResponse, VersionResponse},
  AppState,
};

/// GET /status - Health check with index and model details
pub async fn status(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> ApiResult<StatusResponse> {
  let runtime = &state.runtime;
  let memory = match runtime.settings.memory {
    MemoryBackend::InMemory => "in-memory",
    MemoryBackend::Durable => "durable",
  };

  let response = StatusResponse {
    status: "healthy".to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
    chunks: runtime.index.len().await,
    dimension: runtime.index.dimension().await,
    embedding_model: runtime.index.embedding_model().await,
    chat_model: runtime.chat_model.clone(),
    memory: memory.to_string(),
  };
  Ok(Json(BaseResponse::success(response, context.request_id)))
}

/// GET /version - Returns current API version
pub async fn version() -> Json<BaseResponse<VersionResponse>> {
  let response = VersionResponse { version: env!("CARGO_PKG_VERSION").to_string() };
  Json(BaseResponse::success(response, Uuid::new_v4()))
}

/// GET /sources - Documents in the index with page and chunk counts
pub async fn sources(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> ApiResult<SourcesResponse> {
  let sources = state.runtime.index.sources().await;
  Ok(Json(BaseResponse::success(SourcesResponse { sources }, context.request_id)))
}
