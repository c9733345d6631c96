use axum::routing::get;
use axum::Router;

use crate::handlers::objects;
use crate::state::AppState;

/// ```text
/// GET /objects               -> list_objects
/// GET /objects/{camera_id}   -> list_camera_objects
/// GET /history               -> list_history
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/objects", get(objects::list_objects))
        .route("/objects/{camera_id}", get(objects::list_camera_objects))
        .route("/history", get(objects::list_history))
}
