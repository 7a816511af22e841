//! HTTP Server
//!
//! Binds the listener and serves the application until a shutdown
//! signal arrives.

use crate::core::ServerState;
use crate::routes;
use crate::utils::{AppError, AppResult};

pub struct Server {
    state: ServerState,
}

impl Server {
    pub fn with_state(state: ServerState) -> Self {
        Self { state }
    }

    pub async fn run(self) -> AppResult<()> {
        let addr = format!("0.0.0.0:{}", self.state.config.http_port);
        let app = routes::build_app().with_state(self.state.clone());

        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")))?;
        tracing::info!(%addr, environment = %self.state.config.environment, "HTTP server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| AppError::internal(format!("Server error: {e}")))
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        return;
    }
    tracing::info!("Shutdown signal received");
}
