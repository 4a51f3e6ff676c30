//! Calcuingo · calculus trainer backend
//!
//! - Axum HTTP API over a SQLite store
//! - Static frontend fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT             : u16 (default 3000)
//!   DATABASE_PATH    : SQLite file (default "calcuingo.db")
//!   APP_CONFIG_PATH  : path to TOML config (app settings, badges, lessons)
//!   LOG_LEVEL        : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT       : "pretty" (default) or "json"

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;

use calcuingo_backend::config::ServerSettings;
use calcuingo_backend::routes::build_router;
use calcuingo_backend::state::AppState;
use calcuingo_backend::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let settings = ServerSettings::from_env();

  // Open + seed the store and build the reward engine.
  let state = Arc::new(AppState::from_env(&settings)?);

  let app = build_router(state.clone());

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "calcuingo_backend", %addr, db = %settings.database_path.display(), "HTTP server listening");
  axum::serve(listener, app)
    .with_graceful_shutdown(shutdown_signal())
    .await?;
  Ok(())
}

async fn shutdown_signal() {
  if let Err(e) = tokio::signal::ctrl_c().await {
    tracing::error!(target: "calcuingo_backend", error = %e, "Failed to listen for shutdown signal");
    std::future::pending::<()>().await;
  }
  info!(target: "calcuingo_backend", "Shutdown signal received");
}
