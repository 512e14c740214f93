use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{info, warn};
use vellum_store::{FileVersionLog, VersionReader};

use crate::config::ServerConfig;
use crate::error::ServerResult;
use crate::router::build_router;
use crate::state::AppState;

/// Vellum HTTP server.
pub struct VellumServer {
    config: ServerConfig,
    state: AppState,
}

impl VellumServer {
    /// Serve from an already-open reader.
    pub fn new(config: ServerConfig, reader: Arc<dyn VersionReader>) -> Self {
        let state = AppState::new(reader, &config);
        Self { config, state }
    }

    /// Open the durable log named by the config and serve from it.
    pub fn open(config: ServerConfig) -> ServerResult<Self> {
        let log = FileVersionLog::open(&config.store_path, config.sync)?;
        info!(store = %config.store_path.display(), versions = log.len(), "store opened");
        Ok(Self::new(config, Arc::new(log)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.state.clone())
    }

    /// Serve until Ctrl+C.
    pub async fn serve(self) -> ServerResult<()> {
        let app = self.router();
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        info!(addr = %self.config.bind_addr, "Vellum server listening");
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Vellum server stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("shutdown signal received"),
        Err(e) => warn!(error = %e, "could not listen for shutdown signal"),
    }
}
