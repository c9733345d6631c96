use axum::routing::get;
use axum::Router;

use crate::handlers::map;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/camera_positions", get(map::camera_positions))
}
