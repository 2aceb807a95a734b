use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use axum::{Json, Router};
use salesboard_core::{Dashboard, DashboardError};

use crate::render;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(page))
        .route("/api/dashboard", get(dashboard_json))
        .route("/healthz", get(healthz))
        .with_state(state)
}

fn internal_error(err: DashboardError) -> StatusCode {
    tracing::error!("dashboard refresh failed: {err}");
    StatusCode::INTERNAL_SERVER_ERROR
}

pub async fn page(State(state): State<AppState>) -> Result<Html<String>, StatusCode> {
    let dashboard = state.current().await.map_err(internal_error)?;
    let refresh_secs = state.config().dashboard.refresh_interval_secs;
    Ok(Html(render::dashboard_page(&dashboard, refresh_secs)))
}

pub async fn dashboard_json(
    State(state): State<AppState>,
) -> Result<Json<Arc<Dashboard>>, StatusCode> {
    state.current().await.map(Json).map_err(internal_error)
}

pub async fn healthz() -> &'static str {
    "ok"
}
