//! Retrieval endpoint handler

use axum::{
  extract::{Extension, State},
  http::StatusCode,
  response::Json,
};

use crate::server::{
  middleware::RequestContext,
  types::{api_failure, ApiResult, BaseResponse, SearchRequest, SearchResponse},
  AppState,
};

/// POST /search - Nearest chunks for a query, without the language model
pub async fn search(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<SearchRequest>,
) -> ApiResult<SearchResponse> {
  let transaction_id = context.request_id;
  let limit = request.limit.unwrap_or(state.runtime.settings.top_k);

  match state.runtime.conversation.search(&request.query, limit).await {
    Ok(hits) => {
      context.log_info(&format!("Search returned {} hits", hits.len()), "search-api").await;
      Ok(Json(BaseResponse::success(SearchResponse { hits }, transaction_id)))
    }
    Err(e) => {
      context.log_error(&format!("Search failed: {e}"), "search-api").await;
      let status =
        if e.is_service_failure() { StatusCode::BAD_GATEWAY } else { StatusCode::INTERNAL_SERVER_ERROR };
      Err(api_failure(status, "search_failed", &e.to_string(), transaction_id))
    }
  }
}
