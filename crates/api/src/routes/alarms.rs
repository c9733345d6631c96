use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::alarms;
use crate::state::AppState;

/// Alarm zone routes mounted at `/alarms`.
///
/// ```text
/// GET    /              -> list_alarms
/// POST   /              -> create_alarm
/// DELETE /{id}          -> delete_alarm
/// POST   /status/{id}   -> toggle_alarm
/// PATCH  /status/{id}   -> toggle_alarm
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(alarms::list_alarms).post(alarms::create_alarm))
        .route("/{id}", delete(alarms::delete_alarm))
        .route(
            "/status/{id}",
            post(alarms::toggle_alarm).patch(alarms::toggle_alarm),
        )
}
