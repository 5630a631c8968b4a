//! REST surface over a running monitor.
//!
//! - `GET  /state`: the full [`DashboardView`](crate::pipeline::DashboardView)
//! - `GET  /series`: rolling current series, oldest first
//! - `GET  /advisories`: current health and advisory list
//! - `GET  /devices`: per-device readings from the last applied batch
//! - `GET  /devices/{device_id}`: one device from the last applied batch
//! - `POST /devices/{device_id}/control/{action}[?level=N]`: forwards a
//!   control command (`on`, `off`, `start`, `inject-fault`, `brightness`) to
//!   the backend, then triggers an immediate telemetry refetch

mod handlers;
mod types;

pub use types::{AdvisoriesResponse, ControlQuery, DevicesResponse, ErrorResponse};

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::monitor::MonitorClient;

/// State shared across request handlers.
///
/// Handlers only read published views or forward commands, so no lock is
/// needed here.
pub struct AppState {
    pub monitor: MonitorClient,
}

impl AppState {
    pub fn new(monitor: MonitorClient) -> Arc<Self> {
        Arc::new(Self { monitor })
    }
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
///
/// # Returns
///
/// Configured `Router` ready to serve.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/series", get(handlers::get_series))
        .route("/advisories", get(handlers::get_advisories))
        .route("/devices", get(handlers::get_devices))
        .route("/devices/{device_id}", get(handlers::get_device))
        .route(
            "/devices/{device_id}/control/{action}",
            post(handlers::post_control),
        )
        .with_state(state)
}

/// Binds to `addr` and serves the API on a background task.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind.
pub async fn spawn(state: Arc<AppState>, addr: SocketAddr) -> io::Result<ApiHandle> {
    let listener = TcpListener::bind(addr).await?;
    let address = listener.local_addr()?;
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    });
    let task = tokio::spawn(async move {
        if let Err(err) = server.await {
            warn!(error = %err, "api server exited with error");
        }
    });
    info!(%address, "api server listening");

    Ok(ApiHandle {
        address,
        task,
        shutdown: shutdown_tx,
    })
}

/// Handle to a running API server.
#[derive(Debug)]
pub struct ApiHandle {
    address: SocketAddr,
    task: JoinHandle<()>,
    shutdown: watch::Sender<bool>,
}

impl ApiHandle {
    /// Address the server is bound to (useful when binding port 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.address
    }

    /// Requests graceful shutdown and waits for in-flight requests to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(err) = self.task.await {
            warn!(error = %err, "api server task ended abnormally");
        }
    }
}
