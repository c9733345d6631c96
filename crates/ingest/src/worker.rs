//! Single-consumer ingestion worker.
//!
//! Every decoded frame goes through one `mpsc` queue into one task, so the
//! tracker sees frames strictly one at a time in arrival order.

use chrono::Utc;
use eagleeye_fusion::SharedTracker;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::decode::FrameMessage;

/// Queue depth between the bridge and the worker.
pub const DEFAULT_QUEUE_CAPACITY: usize = 1024;

pub struct IngestionWorker {
    tracker: SharedTracker,
}

impl IngestionWorker {
    pub fn new(tracker: SharedTracker) -> Self {
        Self { tracker }
    }

    /// Apply frames until the queue closes or `cancel` fires. Returns the
    /// number of frames applied.
    pub async fn run(self, mut receiver: mpsc::Receiver<FrameMessage>, cancel: CancellationToken) -> usize {
        let mut applied = 0usize;
        loop {
            let frame = tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Ingestion worker cancelled");
                    break;
                }
                frame = receiver.recv() => frame,
            };
            let Some(FrameMessage {
                camera_id,
                observations,
            }) = frame
            else {
                tracing::info!("Frame queue closed, ingestion worker shutting down");
                break;
            };

            if applied == 0 {
                tracing::info!(camera_id = %camera_id, "First frame received, system ready");
            }

            self.tracker
                .add_observations(&camera_id, observations, Utc::now())
                .await;
            applied += 1;
        }
        applied
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use eagleeye_core::geo::GeoPoint;
    use eagleeye_core::map::CoordinateMapper;
    use eagleeye_core::observation::{Geoposition, Observation};
    use eagleeye_events::EventBus;
    use eagleeye_fusion::{AlarmManager, FusionTracker, TrackerConfig};
    use eagleeye_store::repositories::{AlarmRepo, MemoryObservationLog};

    use super::*;

    fn tracker(dir: &tempfile::TempDir) -> SharedTracker {
        let alarms = AlarmManager::load(
            AlarmRepo::new(dir.path().join("alarms.json")),
            Arc::new(EventBus::default()),
        )
        .expect("alarms");
        let mapper = CoordinateMapper::from_corners(
            GeoPoint::new(59.3250, 18.0700),
            GeoPoint::new(59.3250, 18.0710),
            GeoPoint::new(59.3240, 18.0700),
        )
        .expect("mapper");
        SharedTracker::new(FusionTracker::new(
            TrackerConfig::default(),
            Arc::new(mapper),
            Arc::new(alarms),
            Arc::new(MemoryObservationLog::new()),
        ))
    }

    fn frame(camera_id: &str) -> FrameMessage {
        FrameMessage {
            camera_id: camera_id.to_string(),
            observations: vec![Observation {
                timestamp: Some(Utc::now()),
                geoposition: Some(Geoposition::new(59.3245, 18.0705)),
                ..Default::default()
            }],
        }
    }

    #[tokio::test]
    async fn applies_queued_frames_until_the_queue_closes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let shared = tracker(&dir);
        let (tx, rx) = mpsc::channel(8);

        tx.send(frame("1")).await.expect("queued");
        tx.send(frame("2")).await.expect("queued");
        drop(tx);

        let applied = IngestionWorker::new(shared.clone())
            .run(rx, CancellationToken::new())
            .await;
        assert_eq!(applied, 2);
        assert!(!shared.all_objects().await.is_empty());
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let dir = tempfile::tempdir().expect("tempdir");
        let (_tx, rx) = mpsc::channel::<FrameMessage>(8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let applied = IngestionWorker::new(tracker(&dir)).run(rx, cancel).await;
        assert_eq!(applied, 0);
    }
}
