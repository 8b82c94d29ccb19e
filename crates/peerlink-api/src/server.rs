//! Registry server lifecycle.
//!
//! Binds the listen address (port `0` picks an ephemeral port), serves the
//! router on a background task, and stops gracefully when the handle's
//! watch channel fires.

use crate::rate_limiter::{create_rate_limiter, gcra_rate_limit};
use crate::routes::{self, AppState};
use axum::routing::{delete, get, post};
use axum::{middleware, Router};
use peerlink_registry::PeerRegistry;
use peerlink_types::config::RegistryConfig;
use peerlink_types::error::{PeerLinkError, PeerLinkResult};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Build the full registry router.
pub fn build_router(registry: PeerRegistry, rate_limit_per_minute: u32) -> Router {
    let state = Arc::new(AppState { registry });
    let limiter = create_rate_limiter(rate_limit_per_minute);

    Router::new()
        .route("/register/", post(routes::register))
        .route("/available/", get(routes::available))
        .route("/available", get(routes::available))
        .route("/unregister/{username}", delete(routes::unregister))
        .route("/send/", post(routes::send))
        .route("/health", get(routes::health))
        .layer(middleware::from_fn_with_state(limiter, gcra_rate_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Handle to a running registry server. Drop or call `shutdown()` to stop.
pub struct ServerHandle {
    /// The address the server is listening on.
    pub addr: SocketAddr,
    /// The registry served (shared with the handlers).
    pub registry: PeerRegistry,
    shutdown_tx: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl ServerHandle {
    /// Base URL clients should use, e.g. `http://127.0.0.1:8000`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Signal graceful shutdown and wait for in-flight requests to finish.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
        info!(addr = %self.addr, "registry server stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

/// Open the registry described by `config` and serve it on `listen_addr`.
pub async fn start_server(config: &RegistryConfig) -> PeerLinkResult<ServerHandle> {
    let registry = PeerRegistry::from_config(config)?;
    start_with_registry(&config.listen_addr, registry, config.rate_limit_per_minute).await
}

/// Serve an existing registry on `listen_addr`.
pub async fn start_with_registry(
    listen_addr: &str,
    registry: PeerRegistry,
    rate_limit_per_minute: u32,
) -> PeerLinkResult<ServerHandle> {
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| PeerLinkError::Config(format!("cannot bind {listen_addr}: {e}")))?;
    let addr = listener.local_addr()?;
    let app = build_router(registry.clone(), rate_limit_per_minute);

    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let task = tokio::spawn(async move {
        let server = axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            let _ = shutdown_rx.wait_for(|v| *v).await;
            info!("registry server received shutdown signal");
        });

        if let Err(e) = server.await {
            error!("registry server error: {e}");
        }
    });

    info!(addr = %addr, "registry listening on http://{addr}");

    Ok(ServerHandle {
        addr,
        registry,
        shutdown_tx,
        task: Some(task),
    })
}
