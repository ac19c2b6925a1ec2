//! Session endpoint handlers

use axum::{
  extract::{Extension, Path, State},
  http::StatusCode,
  response::Json,
};

use crate::server::{
  middleware::RequestContext,
  types::{
    api_failure, ApiResult, BaseResponse, HistoryResponse, SendMessageRequest, SendMessageResponse,
    SessionsResponse,
  },
  AppState,
};

const COMPONENT: &str = "sessions-api";

/// POST /sessions/{id}/messages - Run one conversation turn
pub async fn send_message(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Path(session_id): Path<String>,
  Json(request): Json<SendMessageRequest>,
) -> ApiResult<SendMessageResponse> {
  let transaction_id = context.request_id;

  let message = request.message.trim();
  if message.is_empty() {
    return Err(api_failure(StatusCode::BAD_REQUEST, "empty_message", "Message must not be empty", transaction_id));
  }

  match state.runtime.conversation.reply(&session_id, message).await {
    Ok(reply) => {
      if let Some(failure) = &reply.failure {
        context.log_error(&format!("Turn failed for session {session_id}: {failure}"), COMPONENT).await;
      }

      let response =
        SendMessageResponse { session_id, degraded: reply.failure.is_some(), reply: reply.message };
      Ok(Json(BaseResponse::success(response, transaction_id)))
    }
    Err(e) => {
      context.log_error(&format!("Session store failure for {session_id}: {e}"), COMPONENT).await;
      Err(api_failure(
        StatusCode::INTERNAL_SERVER_ERROR,
        "session_store_failed",
        &e.to_string(),
        transaction_id,
      ))
    }
  }
}

/// GET /sessions/{id}/history - All turns of one session
pub async fn get_history(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Path(session_id): Path<String>,
) -> ApiResult<HistoryResponse> {
  let transaction_id = context.request_id;

  match state.runtime.conversation.history(&session_id).await {
    Ok(session) => Ok(Json(BaseResponse::success(HistoryResponse { session }, transaction_id))),
    Err(e) => {
      context.log_error(&format!("Failed to read history for {session_id}: {e}"), COMPONENT).await;
      Err(api_failure(StatusCode::INTERNAL_SERVER_ERROR, "history_read_failed", &e.to_string(), transaction_id))
    }
  }
}

/// GET /sessions - Ids of every known session
pub async fn list_sessions(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> ApiResult<SessionsResponse> {
  let transaction_id = context.request_id;

  match state.runtime.conversation.sessions().await {
    Ok(sessions) => Ok(Json(BaseResponse::success(SessionsResponse { sessions }, transaction_id))),
    Err(e) => {
      context.log_error(&format!("Failed to list sessions: {e}"), COMPONENT).await;
      Err(api_failure(StatusCode::INTERNAL_SERVER_ERROR, "sessions_list_failed", &e.to_string(), transaction_id))
    }
  }
}
