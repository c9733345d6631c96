//! Cross-camera track of one physical entity.

use std::collections::BTreeSet;

use chrono::Duration;
use serde::Serialize;

use crate::observation::{Geoposition, Observation};
use crate::types::{CameraId, ObjectId, Timestamp};

/// A fused track built from observations of one or more cameras.
///
/// Invariant: `observations` is never empty. The object is live while at
/// least one camera reports it.
#[derive(Debug, Clone, Serialize)]
pub struct GlobalObject {
    id: ObjectId,
    observations: Vec<Observation>,
    cameras: BTreeSet<CameraId>,
    #[serde(skip)]
    last_heatmap_write: Option<Timestamp>,
}

impl GlobalObject {
    /// Start a new track from its first observation.
    pub fn new(initial: Observation, camera_id: impl Into<CameraId>) -> Self {
        Self {
            id: ObjectId::new_v4(),
            observations: vec![initial],
            cameras: BTreeSet::from([camera_id.into()]),
            last_heatmap_write: None,
        }
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn cameras(&self) -> &BTreeSet<CameraId> {
        &self.cameras
    }

    pub fn last_observation(&self) -> &Observation {
        &self.observations[self.observations.len() - 1]
    }

    pub fn is_live(&self) -> bool {
        !self.cameras.is_empty()
    }

    pub fn is_reported_by(&self, camera_id: &str) -> bool {
        self.cameras.contains(camera_id)
    }

    /// Attach `observation` reported by `camera_id`.
    ///
    /// The camera is always registered. The observation itself is only
    /// appended when it is strictly newer than the latest one (if both carry
    /// timestamps) and its geoposition differs; returns whether it was.
    pub fn add_observation(&mut self, observation: Observation, camera_id: impl Into<CameraId>) -> bool {
        self.cameras.insert(camera_id.into());

        let last = self.last_observation();
        if let (Some(new_ts), Some(last_ts)) = (observation.timestamp, last.timestamp) {
            if new_ts <= last_ts {
                return false;
            }
        }
        if same_coordinates(last.geoposition.as_ref(), observation.geoposition.as_ref()) {
            return false;
        }

        self.observations.push(observation);
        true
    }

    /// Drop `camera_id` from the reporting set; returns whether the set is now empty.
    pub fn remove_camera(&mut self, camera_id: &str) -> bool {
        self.cameras.remove(camera_id);
        self.cameras.is_empty()
    }

    /// Most recent geoposition that is actually usable.
    pub fn last_valid_geoposition(&self) -> Option<Geoposition> {
        self.observations
            .iter()
            .rev()
            .find(|o| o.has_valid_geoposition())
            .and_then(|o| o.geoposition)
    }

    /// Heatmap sampling throttle.
    ///
    /// Returns `true` and records `now` if at least `min_interval` elapsed
    /// since the last sample (or none was taken yet).
    pub fn try_mark_heatmap_sample(&mut self, now: Timestamp, min_interval: Duration) -> bool {
        if let Some(last) = self.last_heatmap_write {
            if now - last < min_interval {
                return false;
            }
        }
        self.last_heatmap_write = Some(now);
        true
    }
}

fn same_coordinates(a: Option<&Geoposition>, b: Option<&Geoposition>) -> bool {
    let lat_lon = |g: Option<&Geoposition>| g.map_or((None, None), |g| (g.latitude, g.longitude));
    lat_lon(a) == lat_lon(b)
}
