use std::{net::SocketAddr, sync::Arc};

use axum::Router;
use configs::AppConfig;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::errors::StartupError;
use crate::routes::{self, AppState};
use service::{
    runtime,
    tracking::{MemoryTrackingStore, TrackingStore},
};

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn parse_bind_addr(cfg: &AppConfig) -> Result<SocketAddr, StartupError> {
    cfg.bind_addr()
        .parse()
        .map_err(|e| StartupError::InvalidConfig(format!("bind address {}: {e}", cfg.bind_addr())))
}

/// Build the application router with a fresh, empty store.
pub fn build_app(cfg: &AppConfig) -> Router {
    let store: Arc<dyn TrackingStore> = MemoryTrackingStore::new();
    routes::build_router(AppState::new(store), &cfg.frontend, build_cors())
}

/// Serve `app` on `listener`, exposing the peer address to handlers.
pub async fn serve(listener: TcpListener, app: Router) -> anyhow::Result<()> {
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>()).await?;
    Ok(())
}

/// Run the HTTP server with an already loaded and validated config.
/// Logging and `.env` are the caller's business.
pub async fn run(cfg: AppConfig) -> anyhow::Result<()> {
    let addr = parse_bind_addr(&cfg)?;
    let missing = runtime::ensure_frontend(&cfg.frontend.dir).await?;
    if !missing.is_empty() {
        warn!(?missing, dir = %cfg.frontend.dir, "serving without some pages");
    }

    let app = build_app(&cfg);
    info!(%addr, frontend = %cfg.frontend.dir, "starting location tracking server");
    let listener = TcpListener::bind(addr).await?;
    serve(listener, app).await
}
