use axum::Json;
use axum::extract::State;
use axum::response::Html;
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};

use super::AppState;
use super::page::render_home;
use crate::chart::DashboardPayload;

#[derive(Debug, Serialize)]
pub(crate) struct StatusBody {
    result: &'static str,
    message: &'static str,
}

pub(crate) async fn home_handler(State(state): State<AppState>) -> Html<String> {
    Html(render_home(
        &state.chart_types,
        &state.labels,
        state.cpu_name.as_deref(),
    ))
}

pub(crate) async fn dashboard_handler(State(state): State<AppState>) -> Json<DashboardPayload> {
    let charts = state.aggregator.read().await.format(&state.labels);
    Json(DashboardPayload::from_charts(&charts))
}

pub(crate) async fn status_handler() -> Json<StatusBody> {
    Json(StatusBody {
        result: "success",
        message: "Ok",
    })
}

pub(crate) async fn test_logger_handler() -> &'static str {
    trace!("testing from the web server");
    debug!("testing from the web server");
    info!("testing from the web server");
    warn!("testing from the web server");
    error!("testing from the web server");
    "Testing complete, check the server log for output."
}
