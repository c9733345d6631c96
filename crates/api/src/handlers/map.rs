use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/camera_positions
///
/// `{camera_id: {x, y, heading}}` in relative map coordinates.
pub async fn camera_positions(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(state.mapper.camera_positions().clone()))
}
