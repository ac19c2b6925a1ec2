//! Logs endpoint handler

use axum::{
  extract::{Extension, Query, State},
  http::StatusCode,
  response::Json,
};
use bentley::daemon_logs::LogLevel;

use crate::server::{
  middleware::RequestContext,
  types::{api_failure, ApiResult, BaseResponse, LogsQuery, LogsResponse},
  AppState,
};

const DEFAULT_LIMIT: usize = 100;

/// GET /logs - Recent daemon log entries, optionally filtered by level
pub async fn get_logs(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Query(query): Query<LogsQuery>,
) -> ApiResult<LogsResponse> {
  let transaction_id = context.request_id;
  let level = query.level.as_deref().and_then(LogLevel::parse_filter);
  let limit = query.limit.unwrap_or(DEFAULT_LIMIT);

  match state.logs.get_logs(Some(limit), level).await {
    Ok(logs) => Ok(Json(BaseResponse::success(LogsResponse { logs }, transaction_id))),
    Err(e) => {
      context.log_error(&format!("Failed to read logs: {e}"), "logs-api").await;
      Err(api_failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "logs_read_failed",
        &format!("Failed to read logs: {e}"),
        transaction_id,
      ))
    }
  }
}
