use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tracing::info;

use crate::api::health::{health_report, HealthResponse};
use crate::api::latency::{LatencyStats, LatencySummary};
use crate::error::AppError;
use crate::poller::MonitorHandle;
use crate::render::DisplaySurface;
use crate::state::{BoardSnapshot, DisplayBoard};
use crate::types::CheckKind;

#[derive(Clone)]
pub struct ApiState {
    pub app_id: u64,
    pub board: Arc<DisplayBoard>,
    pub latency: Arc<LatencyStats>,
    pub monitor: Arc<MonitorHandle>,
}

pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(get_status))
        .route("/rows/:id", axum::routing::put(put_row).delete(delete_row))
        .route("/health", get(get_health))
        .route("/stats/latency", get(get_stats_latency))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct RowResponse {
    pub id: String,
    pub rows: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn get_status(State(state): State<ApiState>) -> Json<BoardSnapshot> {
    Json(state.board.snapshot())
}

/// Adds a row; it is fetched on the next interface check, not immediately.
async fn put_row(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<(StatusCode, Json<RowResponse>), AppError> {
    let id = id.trim().to_string();
    if id.is_empty() || id.contains('/') {
        return Err(AppError::BadRequest(format!("invalid interface id {id:?}")));
    }

    let status = if state.board.add_row(id.clone()) {
        info!(interface_id = %id, "interface row added");
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(row_response(&state, id))))
}

async fn delete_row(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<RowResponse>, AppError> {
    if !state.board.remove_row(&id) {
        return Err(AppError::NotFound(format!("interface row {id}")));
    }
    info!(interface_id = %id, "interface row removed");
    Ok(Json(row_response(&state, id)))
}

async fn get_health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(health_report(state.app_id, &state.monitor, &state.board))
}

async fn get_stats_latency(State(state): State<ApiState>) -> Json<BTreeMap<String, LatencySummary>> {
    Json(
        CheckKind::ALL
            .into_iter()
            .map(|check| (check.to_string(), state.latency.summary(check)))
            .collect(),
    )
}

fn row_response(state: &ApiState, id: String) -> RowResponse {
    RowResponse { id, rows: state.board.interface_rows() }
}
