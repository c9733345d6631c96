pub mod alarms;
pub mod health;
pub mod heatmap;
pub mod map;
pub mod objects;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
///
/// ```text
/// /objects                    all live objects on the floor plan
/// /objects/{camera_id}        objects seen by one camera
/// /history                    archived objects still within their TTL
///
/// /alarms                     list, create
/// /alarms/{id}                delete
/// /alarms/status/{id}         toggle (POST or PATCH)
///
/// /heatmap/{timeframe}        heatmap over the last `timeframe` minutes
/// /camera_positions           camera markers keyed by camera id
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(objects::router())
        .nest("/alarms", alarms::router())
        .merge(heatmap::router())
        .merge(map::router())
}
