use std::sync::Arc;

use eagleeye_core::map::CoordinateMapper;
use eagleeye_fusion::{AlarmManager, HeatmapAggregator, SharedTracker};

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    /// Live and archived tracks, written by the ingestion worker.
    pub tracker: SharedTracker,
    pub mapper: Arc<CoordinateMapper>,
    pub alarms: Arc<AlarmManager>,
    pub heatmap: HeatmapAggregator,
}
