//! Handlers for alarm zone management.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use eagleeye_core::geo::RelativePoint;
use serde::Deserialize;

use crate::error::AppResult;
use crate::response::MessageResponse;
use crate::state::AppState;

/// Request body for `POST /api/alarms`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlarm {
    pub top_left: RelativePoint,
    pub bottom_right: RelativePoint,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

/// GET /api/alarms
pub async fn list_alarms(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    Ok(Json(serde_json::json!({ "alarms": state.alarms.list() })))
}

/// POST /api/alarms
///
/// The id is assigned server-side. Returns 201 with the stored zone.
pub async fn create_alarm(
    State(state): State<AppState>,
    Json(input): Json<CreateAlarm>,
) -> AppResult<impl IntoResponse> {
    let alarm = state
        .alarms
        .create(input.top_left, input.bottom_right, input.active)?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "alarm": alarm,
            "message": "Alarm zone saved successfully",
        })),
    ))
}

/// DELETE /api/alarms/{id}
pub async fn delete_alarm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.alarms.remove(&id)?;
    Ok(Json(MessageResponse::new("Alarm deleted successfully")))
}

/// POST|PATCH /api/alarms/status/{id}
///
/// Flips `active` and rearms the zone.
pub async fn toggle_alarm(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.alarms.toggle(&id)?;
    Ok(Json(MessageResponse::new("Alarm status updated successfully")))
}
