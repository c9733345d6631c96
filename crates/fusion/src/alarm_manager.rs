//! Alarm zone registry.
//!
//! Holds the in-memory alarm list, evaluates it against placed positions and
//! rewrites the persisted document after every mutation. Firing publishes an
//! `alarm.triggered` event on the bus; delivery happens elsewhere.

use std::sync::{Arc, Mutex, MutexGuard};

use eagleeye_core::alarm::{self, Alarm};
use eagleeye_core::error::CoreError;
use eagleeye_core::geo::RelativePoint;
use eagleeye_core::types::Timestamp;
use eagleeye_events::{DomainEvent, EventBus};
use eagleeye_store::repositories::AlarmRepo;

use crate::error::FusionError;

pub struct AlarmManager {
    alarms: Mutex<Vec<Alarm>>,
    repo: AlarmRepo,
    event_bus: Arc<EventBus>,
}

impl AlarmManager {
    /// Load the persisted alarms (creating an empty document if missing).
    pub fn load(repo: AlarmRepo, event_bus: Arc<EventBus>) -> Result<Self, FusionError> {
        let alarms = repo.load()?;
        tracing::info!(path = %repo.path().display(), count = alarms.len(), "Alarms loaded");
        Ok(Self {
            alarms: Mutex::new(alarms),
            repo,
            event_bus,
        })
    }

    pub fn list(&self) -> Vec<Alarm> {
        self.lock().clone()
    }

    /// Add a new zone with a server-assigned id.
    pub fn create(
        &self,
        top_left: RelativePoint,
        bottom_right: RelativePoint,
        active: bool,
    ) -> Result<Alarm, FusionError> {
        let finite = [top_left.x, top_left.y, bottom_right.x, bottom_right.y]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(CoreError::Validation("alarm corners must be finite numbers".into()).into());
        }

        let alarm = Alarm {
            id: uuid::Uuid::new_v4().to_string(),
            top_left,
            bottom_right,
            active,
            triggered: false,
        };

        let mut alarms = self.lock();
        alarms.push(alarm.clone());
        self.repo.save(&alarms)?;

        tracing::info!(alarm_id = %alarm.id, "Alarm created");
        Ok(alarm)
    }

    /// Delete a zone. Unknown ids are a [`CoreError::NotFound`].
    pub fn remove(&self, id: &str) -> Result<Alarm, FusionError> {
        let mut alarms = self.lock();
        let idx = alarms
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;
        let removed = alarms.remove(idx);
        self.repo.save(&alarms)?;

        tracing::info!(alarm_id = %id, "Alarm removed");
        Ok(removed)
    }

    /// Flip `active` and rearm the zone.
    pub fn toggle(&self, id: &str) -> Result<Alarm, FusionError> {
        let mut alarms = self.lock();
        let alarm = alarms
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| not_found(id))?;
        alarm.toggle();
        let toggled = alarm.clone();
        self.repo.save(&alarms)?;

        tracing::info!(alarm_id = %id, active = toggled.active, "Alarm toggled");
        Ok(toggled)
    }

    /// Evaluate every armed zone against `position`.
    ///
    /// Fired zones are persisted and announced on the event bus. Persistence
    /// failures are logged; the zones stay triggered in memory. Returns the
    /// ids that fired.
    pub fn check_alarms(&self, position: RelativePoint, now: Timestamp) -> Vec<String> {
        let mut alarms = self.lock();
        let fired = alarm::evaluate(&mut alarms, position);
        if fired.is_empty() {
            return Vec::new();
        }

        if let Err(e) = self.repo.save(&alarms) {
            tracing::error!(error = %e, "Failed to persist triggered alarms");
        }

        fired
            .into_iter()
            .map(|idx| {
                let alarm = &alarms[idx];
                tracing::info!(alarm_id = %alarm.id, x = position.x, y = position.y, "Alarm zone entered");
                self.event_bus
                    .publish(DomainEvent::alarm_triggered(alarm, position, now));
                alarm.id.clone()
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Alarm>> {
        self.alarms.lock().unwrap_or_else(|e| e.into_inner())
    }
}

fn not_found(id: &str) -> FusionError {
    CoreError::NotFound {
        entity: "alarm",
        id: id.to_string(),
    }
    .into()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
