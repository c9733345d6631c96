//! Tracker tuning.

use chrono::Duration;
use eagleeye_core::similarity::SimilarityConfig;

/// Knobs for [`FusionTracker`](crate::FusionTracker).
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerConfig {
    /// Match policy for resurrection and live matching.
    pub similarity: SimilarityConfig,
    /// How long an archived object stays resurrectable.
    pub archive_ttl: Duration,
    /// Minimum spacing between two log samples of the same object.
    pub heatmap_sample_interval: Duration,
    /// Flush the log buffer once it holds this many records.
    pub flush_batch_size: usize,
    /// Flush the log buffer once this much time passed since the last flush.
    pub flush_interval: Duration,
    /// Detections with a class score at or below this are discarded at ingestion.
    pub min_class_score: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            similarity: SimilarityConfig::default(),
            archive_ttl: Duration::seconds(15),
            heatmap_sample_interval: Duration::milliseconds(100),
            flush_batch_size: 100,
            flush_interval: Duration::seconds(5),
            min_class_score: 0.85,
        }
    }
}

impl TrackerConfig {
    /// Load from environment variables, falling back to defaults.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `FUSION_ARCHIVE_TTL_SECS`  | `15`    |
    /// | `FUSION_MIN_CLASS_SCORE`   | `0.85`  |
    ///
    /// The similarity policy is read by [`SimilarityConfig::from_env`].
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            similarity: SimilarityConfig::from_env(),
            archive_ttl: std::env::var("FUSION_ARCHIVE_TTL_SECS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|secs| *secs >= 0)
                .map(Duration::seconds)
                .unwrap_or(defaults.archive_ttl),
            min_class_score: std::env::var("FUSION_MIN_CLASS_SCORE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.min_class_score),
            ..defaults
        }
    }
}
