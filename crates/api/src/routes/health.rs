use axum::extract::State;
use axum::{routing::get, Json, Router};
use eagleeye_fusion::TrackerStats;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    /// Name of the loaded floor plan.
    pub map: String,
    pub tracker: TrackerStats,
}

/// GET /health -- returns service status and tracker counters.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        map: state.mapper.name().to_string(),
        tracker: state.tracker.stats().await,
    })
}

/// Mount health check routes (intended for root-level, NOT under `/api`).
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
