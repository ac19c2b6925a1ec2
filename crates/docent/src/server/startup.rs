//! REST server startup and configuration

use anyhow::Result;
use axum::serve;
use bentley::daemon_logs::DaemonLogs;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use super::{routing::create_router, AppState};
use crate::runtime::Runtime;

const COMPONENT: &str = "docent-server";

/// Serve the REST API for `runtime` on `addr` until ctrl-c
pub async fn start_server(runtime: Runtime, addr: SocketAddr) -> Result<()> {
  let logs = DaemonLogs::new(runtime.settings.server_logs_path())?;
  logs.info(&format!("Starting docent REST server on {addr}"), COMPONENT).await;

  let added = runtime.ensure_ingested().await?;
  if added > 0 {
    logs.success(&format!("Ingested {added} chunks at startup"), COMPONENT).await;
  }

  let state = AppState { runtime: Arc::new(runtime), logs: logs.clone() };
  let app = create_router(state)
    .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()));

  let listener = TcpListener::bind(addr).await?;
  logs.info(&format!("Server listening on {addr}"), COMPONENT).await;
  tracing::info!(%addr, "docent REST server ready");

  let shutdown = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      bentley::warn!("Could not listen for ctrl-c: {e}");
      std::future::pending::<()>().await;
    }
  };

  match serve(listener, app).with_graceful_shutdown(shutdown).await {
    Ok(()) => {
      logs.info("Server shutdown gracefully", COMPONENT).await;
      Ok(())
    }
    Err(e) => {
      logs.error(&format!("Server error: {e}"), COMPONENT).await;
      Err(anyhow::anyhow!("Server error: {e}"))
    }
  }
}
