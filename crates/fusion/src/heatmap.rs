//! Heatmap aggregation over the observation log.

use std::sync::Arc;

use chrono::Duration;
use eagleeye_core::error::CoreError;
use eagleeye_core::heatmap::{HeatmapCell, HeatmapGrid};
use eagleeye_core::map::CoordinateMapper;
use eagleeye_core::types::Timestamp;
use eagleeye_store::repositories::ObservationLog;

use crate::error::FusionError;

/// Log records older than this are pruned before every build.
pub const RETENTION_MINUTES: i64 = 1440;

/// Builds heatmaps on demand from the observation log.
#[derive(Clone)]
pub struct HeatmapAggregator {
    log: Arc<dyn ObservationLog>,
    mapper: Arc<CoordinateMapper>,
}

impl HeatmapAggregator {
    pub fn new(log: Arc<dyn ObservationLog>, mapper: Arc<CoordinateMapper>) -> Self {
        Self { log, mapper }
    }

    /// Heatmap of the last `timeframe_minutes` before `now`.
    pub fn build(&self, timeframe_minutes: i64, now: Timestamp) -> Result<Vec<HeatmapCell>, FusionError> {
        if timeframe_minutes <= 0 {
            return Err(CoreError::Validation(format!(
                "timeframe must be a positive number of minutes, got {timeframe_minutes}"
            ))
            .into());
        }

        let pruned = self
            .log
            .prune_older_than(now - Duration::minutes(RETENTION_MINUTES))?;
        if pruned > 0 {
            tracing::debug!(pruned, "Expired heatmap records removed");
        }

        // Nothing older than the retention window survives the prune above.
        let window = timeframe_minutes.min(RETENTION_MINUTES);
        let records = self.log.read_since(now - Duration::minutes(window))?;

        let mut grid = HeatmapGrid::new();
        for record in &records {
            let Some(point) = record.position() else {
                continue;
            };
            grid.add(self.mapper.to_relative(point));
        }

        let cells = grid.cells();
        tracing::debug!(
            timeframe_minutes,
            records = records.len(),
            samples = grid.total(),
            cells = cells.len(),
            "Heatmap built"
        );
        Ok(cells)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use eagleeye_core::geo::GeoPoint;
    use eagleeye_core::observation::{Geoposition, Observation};
    use eagleeye_store::repositories::MemoryObservationLog;

    use super::*;

    fn now() -> Timestamp {
        Utc.with_ymd_and_hms(2025, 5, 16, 21, 34, 0).unwrap()
    }

    fn mapper() -> Arc<CoordinateMapper> {
        Arc::new(
            CoordinateMapper::from_corners(
                GeoPoint::new(59.3250, 18.0700),
                GeoPoint::new(59.3250, 18.0710),
                GeoPoint::new(59.3240, 18.0700),
            )
            .expect("valid square"),
        )
    }

    fn at(minutes_ago: i64, lat: f64, lon: f64) -> Observation {
        Observation {
            timestamp: Some(now() - Duration::minutes(minutes_ago)),
            geoposition: Some(Geoposition::new(lat, lon)),
            ..Default::default()
        }
    }

    #[test]
    fn non_positive_timeframe_is_rejected() {
        let aggregator = HeatmapAggregator::new(Arc::new(MemoryObservationLog::new()), mapper());
        assert_matches!(
            aggregator.build(0, now()),
            Err(FusionError::Core(CoreError::Validation(_)))
        );
        assert_matches!(aggregator.build(-5, now()), Err(FusionError::Core(_)));
    }

    #[test]
    fn busiest_cell_normalizes_to_one() {
        let log = Arc::new(MemoryObservationLog::new());
        log.append(&[
            at(1, 59.3245, 18.0705),
            at(2, 59.3245, 18.0705),
            at(3, 59.3245, 18.0705),
            at(4, 59.3249, 18.0701),
        ])
        .expect("append");

        let cells = HeatmapAggregator::new(log, mapper()).build(60, now()).expect("builds");
        assert_eq!(cells.len(), 2);
        let intensities: Vec<f64> = cells.iter().map(|c| c.intensity).collect();
        assert!(intensities.contains(&1.0));
        assert!(intensities.contains(&0.333));
    }

    #[test]
    fn records_outside_the_window_are_ignored_and_stale_ones_pruned() {
        let log = Arc::new(MemoryObservationLog::new());
        log.append(&[
            at(2000, 59.3245, 18.0705),
            at(90, 59.3245, 18.0705),
            at(5, 59.3245, 18.0705),
        ])
        .expect("append");

        let aggregator = HeatmapAggregator::new(log.clone(), mapper());
        let cells = aggregator.build(60, now()).expect("builds");
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].intensity, 1.0);
        assert_eq!(log.records().len(), 2);
    }

    #[test]
    fn oversized_timeframe_covers_the_retention_window() {
        let log = Arc::new(MemoryObservationLog::new());
        log.append(&[at(1439, 59.3245, 18.0705), at(5, 59.3249, 18.0701)])
            .expect("append");

        let aggregator = HeatmapAggregator::new(log, mapper());
        for minutes in [RETENTION_MINUTES + 1, 1_000_000_000_000, i64::MAX] {
            let cells = aggregator.build(minutes, now()).expect("builds");
            assert_eq!(cells.len(), 2, "timeframe {minutes}");
        }
    }

    #[test]
    fn records_without_position_are_skipped() {
        let log = Arc::new(MemoryObservationLog::new());
        let blind = Observation {
            timestamp: Some(now()),
            ..Default::default()
        };
        log.append(&[blind]).expect("append");

        let cells = HeatmapAggregator::new(log, mapper()).build(60, now()).expect("builds");
        assert!(cells.is_empty());
    }
}
