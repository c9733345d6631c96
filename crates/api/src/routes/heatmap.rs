use axum::routing::get;
use axum::Router;

use crate::handlers::heatmap;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/heatmap/{timeframe}", get(heatmap::get_heatmap))
}
