//! Cross-camera fusion for the EagleEye backend.
//!
//! [`FusionTracker`] owns the live and archived global objects and the
//! buffered observation log output. It is a plain synchronous state machine
//! driven with an explicit `now`; [`SharedTracker`] puts it behind a
//! `tokio::sync::RwLock` for the ingestion worker and the HTTP handlers.
//! [`AlarmManager`] evaluates alarm zones for every placed observation and
//! [`HeatmapAggregator`] turns the observation log into heatmap cells.

pub mod alarm_manager;
pub mod config;
pub mod error;
pub mod heatmap;
pub mod shared;
pub mod tracker;

pub use alarm_manager::AlarmManager;
pub use config::TrackerConfig;
pub use error::FusionError;
pub use heatmap::HeatmapAggregator;
pub use shared::{SharedTracker, TrackerStats};
pub use tracker::{FusionTracker, IngestSummary};
