//! Handlers for live object queries.
//!
//! Positions are reported in relative floor-plan coordinates. Objects with
//! no usable geoposition are left out.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use eagleeye_core::map::CoordinateMapper;
use eagleeye_core::observation::Geoposition;
use serde::Serialize;

use crate::error::AppResult;
use crate::response::PlacedObject;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct SightingOnMap {
    cid: String,
    #[serde(flatten)]
    placed: PlacedObject,
}

#[derive(Debug, Serialize)]
struct CameraObjectOnMap {
    camera_id: String,
    #[serde(flatten)]
    placed: PlacedObject,
}

fn place(mapper: &CoordinateMapper, id: String, geoposition: Option<&Geoposition>) -> Option<PlacedObject> {
    let point = geoposition.and_then(Geoposition::point)?;
    let relative = mapper.to_relative(point);
    Some(PlacedObject {
        x: relative.x,
        y: relative.y,
        id,
    })
}

/// GET /api/objects
///
/// Every live object once per camera that currently sees it.
pub async fn list_objects(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let objects: Vec<SightingOnMap> = state
        .tracker
        .all_objects()
        .await
        .into_iter()
        .filter_map(|s| {
            place(&state.mapper, s.id.to_string(), s.geoposition.as_ref()).map(|placed| SightingOnMap {
                cid: s.camera_id,
                placed,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "objects": objects })))
}

/// GET /api/objects/{camera_id}
pub async fn list_camera_objects(
    State(state): State<AppState>,
    Path(camera_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    let observations: Vec<CameraObjectOnMap> = state
        .tracker
        .objects_geoposition(&camera_id)
        .await
        .into_iter()
        .filter_map(|o| {
            place(&state.mapper, o.id.to_string(), o.geoposition.as_ref()).map(|placed| CameraObjectOnMap {
                camera_id: camera_id.clone(),
                placed,
            })
        })
        .collect();

    Ok(Json(serde_json::json!({ "observations": observations })))
}

/// GET /api/history
///
/// Archived objects that may still be resurrected.
pub async fn list_history(State(state): State<AppState>) -> AppResult<impl IntoResponse> {
    let history = state.tracker.history(Utc::now()).await;
    Ok(Json(serde_json::json!({ "history": history })))
}
