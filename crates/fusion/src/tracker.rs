//! The fusion tracker.
//!
//! Every ingestion cycle takes one camera's detections for one frame and
//! resolves each of them, in order, to
//!
//! 1. an archived object it resurrects (same id as before),
//! 2. a live object it matches, or
//! 3. a brand-new object, if it carries a usable geoposition.
//!
//! Objects the camera reported last cycle but not this one lose the camera;
//! once no camera reports an object it moves to the archive, where it stays
//! resurrectable until the archive TTL runs out.
//!
//! Placed observations are forwarded to the alarm manager and, throttled
//! per object, buffered for the observation log.

use std::collections::HashSet;
use std::sync::Arc;

use eagleeye_core::global_object::GlobalObject;
use eagleeye_core::map::CoordinateMapper;
use eagleeye_core::observation::{BoundingBox, Classification, Geoposition, Observation};
use eagleeye_core::similarity::is_same_entity;
use eagleeye_core::types::{CameraId, ObjectId, Timestamp};
use eagleeye_store::repositories::ObservationLog;
use eagleeye_store::StoreError;
use serde::Serialize;

use crate::alarm_manager::AlarmManager;
use crate::config::TrackerConfig;

// ---------------------------------------------------------------------------
// Read models
// ---------------------------------------------------------------------------

/// Object as seen by one camera.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraObject {
    pub id: ObjectId,
    #[serde(rename = "class")]
    pub classification: Option<Classification>,
    pub geoposition: Option<Geoposition>,
    pub bounding_box: Option<BoundingBox>,
}

/// One (camera, object) pairing across all live objects.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectSighting {
    pub camera_id: CameraId,
    pub id: ObjectId,
    pub geoposition: Option<Geoposition>,
}

/// Latest geoposition of an object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObjectPosition {
    pub id: ObjectId,
    pub geoposition: Option<Geoposition>,
}

/// An archived object still within its TTL.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: ObjectId,
    pub observations: Vec<Observation>,
    pub cameras: Vec<CameraId>,
    pub archived_at: Timestamp,
}

/// What one ingestion cycle did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSummary {
    pub resurrected: usize,
    pub matched: usize,
    pub created: usize,
    pub dropped: usize,
    pub archived: usize,
    pub purged: usize,
}

// ---------------------------------------------------------------------------
// FusionTracker
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct ArchivedObject {
    object: GlobalObject,
    archived_at: Timestamp,
}

/// Live and archived global objects plus the pending log buffer.
pub struct FusionTracker {
    config: TrackerConfig,
    mapper: Arc<CoordinateMapper>,
    alarms: Arc<AlarmManager>,
    log: Arc<dyn ObservationLog>,
    live: Vec<GlobalObject>,
    archive: Vec<ArchivedObject>,
    buffer: Vec<Observation>,
    last_flush: Option<Timestamp>,
}

impl FusionTracker {
    pub fn new(
        config: TrackerConfig,
        mapper: Arc<CoordinateMapper>,
        alarms: Arc<AlarmManager>,
        log: Arc<dyn ObservationLog>,
    ) -> Self {
        Self {
            config,
            mapper,
            alarms,
            log,
            live: Vec::new(),
            archive: Vec::new(),
            buffer: Vec::new(),
            last_flush: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn archived_count(&self) -> usize {
        self.archive.len()
    }

    pub fn buffered_count(&self) -> usize {
        self.buffer.len()
    }

    /// Fold one frame of `camera_id`'s detections into the tracked state.
    pub fn add_observations(
        &mut self,
        camera_id: &str,
        observations: Vec<Observation>,
        now: Timestamp,
    ) -> IngestSummary {
        let mut summary = IngestSummary {
            purged: self.prune_archive(now),
            ..Default::default()
        };
        self.last_flush.get_or_insert(now);

        let previously_seen: Vec<ObjectId> = self
            .live
            .iter()
            .filter(|o| o.is_reported_by(camera_id))
            .map(GlobalObject::id)
            .collect();
        let mut seen_now: HashSet<ObjectId> = HashSet::new();

        for observation in observations {
            let observation = observation.with_camera(camera_id);
            let Some((idx, attached)) = self.attach(camera_id, observation, &mut summary) else {
                continue;
            };
            seen_now.insert(self.live[idx].id());
            self.emit(idx, attached, now);
        }

        for id in previously_seen.into_iter().filter(|id| !seen_now.contains(id)) {
            if self.drop_camera(id, camera_id, now) {
                summary.archived += 1;
            }
        }

        self.maybe_flush(now);

        tracing::debug!(
            camera_id,
            resurrected = summary.resurrected,
            matched = summary.matched,
            created = summary.created,
            dropped = summary.dropped,
            archived = summary.archived,
            purged = summary.purged,
            live = self.live.len(),
            "Frame fused"
        );
        summary
    }

    /// Resolve `observation` to a live object. Returns the object's index in
    /// `live` and the observation as attached (geoposition back-filled).
    fn attach(
        &mut self,
        camera_id: &str,
        mut observation: Observation,
        summary: &mut IngestSummary,
    ) -> Option<(usize, Observation)> {
        let similarity = &self.config.similarity;

        if let Some(pos) = self
            .archive
            .iter()
            .position(|a| is_same_entity(a.object.last_observation(), &observation, similarity))
        {
            let mut object = self.archive.remove(pos).object;
            backfill_geoposition(&object, &mut observation);
            object.add_observation(observation.clone(), camera_id);
            tracing::info!(object_id = %object.id(), camera_id, "Object resurrected");
            self.live.push(object);
            summary.resurrected += 1;
            return Some((self.live.len() - 1, observation));
        }

        if let Some(idx) = self
            .live
            .iter()
            .position(|o| is_same_entity(o.last_observation(), &observation, similarity))
        {
            backfill_geoposition(&self.live[idx], &mut observation);
            self.live[idx].add_observation(observation.clone(), camera_id);
            summary.matched += 1;
            return Some((idx, observation));
        }

        if !observation.has_valid_geoposition() {
            tracing::debug!(camera_id, "Dropping unmatched observation without a valid geoposition");
            summary.dropped += 1;
            return None;
        }

        let object = GlobalObject::new(observation.clone(), camera_id);
        tracing::debug!(object_id = %object.id(), camera_id, "Object created");
        self.live.push(object);
        summary.created += 1;
        Some((self.live.len() - 1, observation))
    }

    /// Alarm check and log sampling for an attached observation.
    fn emit(&mut self, idx: usize, mut observation: Observation, now: Timestamp) {
        let Some(point) = observation.position() else {
            return;
        };

        let relative = self.mapper.to_relative(point);
        self.alarms.check_alarms(relative, now);

        if self.live[idx].try_mark_heatmap_sample(now, self.config.heatmap_sample_interval) {
            observation.timestamp.get_or_insert(now);
            self.buffer.push(observation);
        }
    }

    /// Remove `camera_id` from object `id`; archive it if nobody reports it
    /// any more. Returns whether it was archived.
    fn drop_camera(&mut self, id: ObjectId, camera_id: &str, now: Timestamp) -> bool {
        let Some(idx) = self.live.iter().position(|o| o.id() == id) else {
            return false;
        };
        if !self.live[idx].remove_camera(camera_id) {
            return false;
        }

        let object = self.live.remove(idx);
        tracing::debug!(object_id = %object.id(), camera_id, "Object archived");
        self.archive.push(ArchivedObject {
            object,
            archived_at: now,
        });
        true
    }

    /// Purge archive entries older than the TTL. Returns how many went.
    fn prune_archive(&mut self, now: Timestamp) -> usize {
        let ttl = self.config.archive_ttl;
        let before = self.archive.len();
        self.archive.retain(|a| now - a.archived_at <= ttl);
        before - self.archive.len()
    }

    fn maybe_flush(&mut self, now: Timestamp) {
        let due = self.buffer.len() >= self.config.flush_batch_size
            || self
                .last_flush
                .is_some_and(|last| now - last >= self.config.flush_interval);
        if !due {
            return;
        }
        if let Err(e) = self.flush(now) {
            tracing::error!(error = %e, "Failed to flush observation buffer");
        }
    }

    /// Append the buffered records to the observation log.
    ///
    /// The buffer is cleared whether or not the write succeeds.
    pub fn flush(&mut self, now: Timestamp) -> Result<usize, StoreError> {
        self.last_flush = Some(now);
        if self.buffer.is_empty() {
            return Ok(0);
        }
        let records = std::mem::take(&mut self.buffer);
        self.log.append(&records)?;
        tracing::debug!(count = records.len(), "Observation buffer flushed");
        Ok(records.len())
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Live objects reported by `camera_id`, with their latest attributes.
    pub fn objects_by_camera(&self, camera_id: &str) -> Vec<CameraObject> {
        self.live
            .iter()
            .filter(|o| o.is_reported_by(camera_id))
            .map(|o| {
                let last = o.last_observation();
                CameraObject {
                    id: o.id(),
                    classification: last.classification.clone(),
                    geoposition: last.geoposition,
                    bounding_box: last.bounding_box,
                }
            })
            .collect()
    }

    /// One entry per (reporting camera, live object).
    pub fn all_objects(&self) -> Vec<ObjectSighting> {
        self.live
            .iter()
            .flat_map(|o| {
                let geoposition = o.last_observation().geoposition;
                o.cameras().iter().map(move |camera_id| ObjectSighting {
                    camera_id: camera_id.clone(),
                    id: o.id(),
                    geoposition,
                })
            })
            .collect()
    }

    /// Latest geoposition of each live object reported by `camera_id`.
    pub fn objects_geoposition(&self, camera_id: &str) -> Vec<ObjectPosition> {
        self.live
            .iter()
            .filter(|o| o.is_reported_by(camera_id))
            .map(|o| ObjectPosition {
                id: o.id(),
                geoposition: o.last_observation().geoposition,
            })
            .collect()
    }

    /// Archived objects still within the TTL at `now`.
    pub fn history(&self, now: Timestamp) -> Vec<HistoryEntry> {
        let ttl = self.config.archive_ttl;
        self.archive
            .iter()
            .filter(|a| now - a.archived_at <= ttl)
            .map(|a| HistoryEntry {
                id: a.object.id(),
                observations: a.object.observations().to_vec(),
                cameras: a.object.cameras().iter().cloned().collect(),
                archived_at: a.archived_at,
            })
            .collect()
    }
}

/// Fill in a missing geoposition from the object's last valid one.
fn backfill_geoposition(object: &GlobalObject, observation: &mut Observation) {
    if observation.has_valid_geoposition() {
        return;
    }
    if let Some(last) = object.last_valid_geoposition() {
        observation.geoposition = Some(last);
    }
}
