//! Shared handle to the tracker.
//!
//! Ingestion takes the write lock for a whole frame; queries take the read
//! lock, so a reader never sees a half-applied frame.

use std::sync::Arc;

use eagleeye_core::observation::Observation;
use eagleeye_core::types::Timestamp;
use eagleeye_store::StoreError;
use tokio::sync::RwLock;

use crate::tracker::{CameraObject, FusionTracker, HistoryEntry, IngestSummary, ObjectPosition, ObjectSighting};

/// Cheaply cloneable handle around a [`FusionTracker`].
#[derive(Clone)]
pub struct SharedTracker {
    inner: Arc<RwLock<FusionTracker>>,
}

/// Point-in-time counters for health reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TrackerStats {
    pub live: usize,
    pub archived: usize,
    pub buffered: usize,
}

impl SharedTracker {
    pub fn new(tracker: FusionTracker) -> Self {
        Self {
            inner: Arc::new(RwLock::new(tracker)),
        }
    }

    pub async fn add_observations(
        &self,
        camera_id: &str,
        observations: Vec<Observation>,
        now: Timestamp,
    ) -> IngestSummary {
        self.inner
            .write()
            .await
            .add_observations(camera_id, observations, now)
    }

    pub async fn objects_by_camera(&self, camera_id: &str) -> Vec<CameraObject> {
        self.inner.read().await.objects_by_camera(camera_id)
    }

    pub async fn all_objects(&self) -> Vec<ObjectSighting> {
        self.inner.read().await.all_objects()
    }

    pub async fn objects_geoposition(&self, camera_id: &str) -> Vec<ObjectPosition> {
        self.inner.read().await.objects_geoposition(camera_id)
    }

    pub async fn history(&self, now: Timestamp) -> Vec<HistoryEntry> {
        self.inner.read().await.history(now)
    }

    pub async fn flush(&self, now: Timestamp) -> Result<usize, StoreError> {
        self.inner.write().await.flush(now)
    }

    pub async fn stats(&self) -> TrackerStats {
        let tracker = self.inner.read().await;
        TrackerStats {
            live: tracker.live_count(),
            archived: tracker.archived_count(),
            buffered: tracker.buffered_count(),
        }
    }
}
