//! REST API for docent
//!
//! axum for routing, schemars annotations on every request and response type,
//! and a JSONL daemon log behind `GET /logs`.

pub mod handlers;
pub mod middleware;
pub mod routing;
pub mod startup;
pub mod types;

use bentley::daemon_logs::DaemonLogs;
use std::sync::Arc;

use crate::runtime::Runtime;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
  pub runtime: Arc<Runtime>,
  pub logs: DaemonLogs,
}
