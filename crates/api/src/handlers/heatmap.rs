use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// GET /api/heatmap/{timeframe}
///
/// `timeframe` is in minutes. Reading the log is blocking file I/O, so the
/// build runs on the blocking pool.
pub async fn get_heatmap(
    State(state): State<AppState>,
    Path(timeframe): Path<String>,
) -> AppResult<impl IntoResponse> {
    let minutes: i64 = timeframe
        .parse()
        .map_err(|_| AppError::BadRequest(format!("timeframe must be an integer, got '{timeframe}'")))?;

    let aggregator = state.heatmap.clone();
    let cells = tokio::task::spawn_blocking(move || aggregator.build(minutes, Utc::now()))
        .await
        .map_err(|e| AppError::InternalError(format!("heatmap task failed: {e}")))??;

    Ok(Json(serde_json::json!({ "heatmap": cells })))
}
