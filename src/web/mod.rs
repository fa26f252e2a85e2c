//! HTTP surface of the dashboard.

mod handlers;
mod page;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tokio::net::TcpListener;
use tracing::info;

use crate::locale::Labels;
use crate::system::aggregator::SharedAggregator;
use crate::system::history::Category;

pub use page::render_home;

/// Shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: SharedAggregator,
    pub labels: Arc<Labels>,
    pub cpu_name: Option<String>,
    /// Chart containers laid out on the home page.
    pub chart_types: Arc<Vec<Category>>,
}

impl AppState {
    pub fn new(
        aggregator: SharedAggregator,
        labels: Labels,
        cpu_name: Option<String>,
        chart_types: Vec<Category>,
    ) -> Self {
        Self {
            aggregator,
            labels: Arc::new(labels),
            cpu_name,
            chart_types: Arc::new(chart_types),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::home_handler))
        .route("/home", get(handlers::home_handler))
        .route("/callback/dashboard", get(handlers::dashboard_handler))
        .route("/status", get(handlers::status_handler))
        .route("/test_logger", get(handlers::test_logger_handler))
        .with_state(state)
}

/// Serve until SIGINT or SIGTERM.
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("dashboard listening on http://{addr}");
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(wait_for_shutdown_signal())
        .await
}

async fn wait_for_shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match (
            signal(SignalKind::terminate()),
            signal(SignalKind::interrupt()),
        ) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => {},
                    _ = sigint.recv() => {},
                }
            }
            _ => {
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
    info!("shutdown signal received");
}
