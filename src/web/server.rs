//! Web server for filenest.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::compression::CompressionLayer;

use crate::config::Config;
use crate::file::BlobStore;
use crate::{Database, FilenestError, Result};

use super::handlers::AppState;
use super::router::{create_health_router, create_openapi_router, create_router};

/// Default interval between expired-session sweeps.
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 120;

/// Web server for the application.
pub struct WebServer {
    /// Server address.
    addr: SocketAddr,
    /// Application state.
    app_state: Arc<AppState>,
    /// Allowed CORS origins.
    cors_origins: Vec<String>,
    /// Interval between expired-session sweeps.
    cleanup_interval: Duration,
}

impl WebServer {
    /// Create a new web server from prepared state.
    pub fn new(addr: SocketAddr, app_state: AppState) -> Self {
        Self {
            addr,
            app_state: Arc::new(app_state),
            cors_origins: Vec::new(),
            cleanup_interval: Duration::from_secs(DEFAULT_CLEANUP_INTERVAL_SECS),
        }
    }

    /// Create a web server described by a configuration.
    pub fn from_config(
        config: &Config,
        db: Arc<Database>,
        blobs: Arc<dyn BlobStore>,
    ) -> Result<Self> {
        let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
            .parse()
            .map_err(|e| FilenestError::Config(format!("invalid server address: {}", e)))?;

        Ok(Self::new(addr, AppState::from_config(db, blobs, config))
            .with_cors_origins(config.web.cors_origins.clone())
            .with_cleanup_interval(Duration::from_secs(
                config.web.session_cleanup_interval_secs,
            )))
    }

    /// Set the allowed CORS origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    /// Set the expired-session sweep interval.
    pub fn with_cleanup_interval(mut self, interval: Duration) -> Self {
        self.cleanup_interval = interval;
        self
    }

    /// Get the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Build the complete application router.
    pub fn router(&self) -> Router {
        create_router(self.app_state.clone(), &self.cors_origins)
            .merge(create_health_router())
            .merge(create_openapi_router())
            .layer(CompressionLayer::new())
    }

    /// Start the session cleanup background task.
    fn start_session_cleanup_task(state: Arc<AppState>, every: Duration) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));

            // Skip the first immediate tick
            interval.tick().await;

            loop {
                interval.tick().await;

                match state.sessions().cleanup_expired().await {
                    Ok(0) => tracing::debug!("No expired sessions to clean up"),
                    Ok(count) => tracing::debug!(deleted_count = count, "Session sweep finished"),
                    Err(e) => tracing::warn!(error = %e, "Failed to cleanup sessions"),
                }
            }
        });
    }

    async fn bind(&self) -> std::io::Result<(TcpListener, SocketAddr)> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;

        Self::start_session_cleanup_task(self.app_state.clone(), self.cleanup_interval);
        tracing::info!(
            interval_secs = self.cleanup_interval.as_secs(),
            "Session cleanup task started"
        );
        tracing::info!("Web server listening on http://{}", local_addr);

        Ok((listener, local_addr))
    }

    /// Run the web server until `shutdown` resolves.
    pub async fn run_until<F>(self, shutdown: F) -> std::io::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.router();
        let (listener, _) = self.bind().await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Run the web server until Ctrl-C.
    pub async fn run(self) -> std::io::Result<()> {
        self.run_until(shutdown_signal()).await
    }

    /// Run the server and return the actual bound address.
    ///
    /// This is useful for testing when binding to port 0.
    pub async fn run_with_addr(self) -> std::io::Result<SocketAddr> {
        let router = self.router();
        let (listener, local_addr) = self.bind().await?;

        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, router).await {
                tracing::error!("Web server error: {}", e);
            }
        });

        Ok(local_addr)
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
