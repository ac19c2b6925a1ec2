//! Request context and middleware for the docent REST API
//!
//! Every request gets an id, a start and a completion record in the daemon
//! log, and a [`RequestContext`] extension handlers can log through.

use axum::{
  extract::{Request, State},
  http::Method,
  middleware::Next,
  response::Response,
};
use bentley::daemon_logs::{DaemonLogs, LogContext, LogLevel};
use std::time::Instant;
use uuid::Uuid;

use super::AppState;

#[derive(Clone)]
pub struct RequestContext {
  pub request_id: Uuid,
  pub method: Method,
  pub path: String,
  pub logger: DaemonLogs,
}

impl RequestContext {
  pub fn new(method: Method, path: String, logger: DaemonLogs) -> Self {
    Self { request_id: Uuid::new_v4(), method, path, logger }
  }

  pub async fn log_info(&self, message: &str, component: &str) {
    self.log(LogLevel::Info, message, component, None, None).await;
  }

  pub async fn log_error(&self, message: &str, component: &str) {
    self.log(LogLevel::Error, message, component, None, None).await;
  }

  async fn log(
    &self,
    level: LogLevel,
    message: &str,
    component: &str,
    status_code: Option<u16>,
    duration_ms: Option<f64>,
  ) {
    let context = LogContext {
      request_id: Some(self.request_id.to_string()),
      method: Some(self.method.to_string()),
      path: Some(self.path.clone()),
      status_code,
      duration_ms,
    };
    self.logger.with_context(level, message, component, context).await;
  }
}

/// Middleware to inject RequestContext into all requests
pub async fn request_context_middleware(
  State(state): State<AppState>,
  mut request: Request,
  next: Next,
) -> Response {
  let context =
    RequestContext::new(request.method().clone(), request.uri().path().to_string(), state.logs.clone());

  let start_time = Instant::now();
  context.log(LogLevel::Verbose, "Request started", "http-request", None, None).await;
  request.extensions_mut().insert(context.clone());

  let response = next.run(request).await;

  let duration_ms = start_time.elapsed().as_secs_f64() * 1000.0;
  let status = response.status();
  let level = if status.is_server_error() { LogLevel::Error } else { LogLevel::Info };
  context.log(level, "Request completed", "http-request", Some(status.as_u16()), Some(duration_ms)).await;

  response
}
