use crate::http::{create_router, AppState};
use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;

#[derive(Debug, Clone)]
pub struct HttpServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// Serve the HTTP API until the token is cancelled.
pub async fn run_http_server(
    config: HttpServerConfig,
    state: AppState,
    cancellation_token: CancellationToken,
) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind HTTP listener on {}", addr))?;
    info!(address = %addr, "starting HTTP server");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            cancellation_token.cancelled().await;
            info!("HTTP server shutdown signal received");
        })
        .await
        .context("HTTP server error")?;

    info!("HTTP server stopped gracefully");
    Ok(())
}
