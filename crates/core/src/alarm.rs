//! Rectangular alarm zones on the floor plan.
//!
//! Pure logic only; persistence and notification live with the caller.

use serde::{Deserialize, Serialize};

use crate::geo::RelativePoint;

/// A user-defined zone in relative (0-100) map coordinates.
///
/// `triggered` is sticky: once set the zone stops firing until a human
/// toggles it. Field names match the persisted JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alarm {
    pub id: String,
    pub top_left: RelativePoint,
    pub bottom_right: RelativePoint,
    pub active: bool,
    pub triggered: bool,
}

impl Alarm {
    /// Whether the zone may fire.
    pub fn is_armed(&self) -> bool {
        self.active && !self.triggered
    }

    /// Inclusive containment test. Corner order in storage does not matter.
    pub fn contains(&self, position: RelativePoint) -> bool {
        let (min_x, max_x) = min_max(self.top_left.x, self.bottom_right.x);
        let (min_y, max_y) = min_max(self.top_left.y, self.bottom_right.y);
        (min_x..=max_x).contains(&position.x) && (min_y..=max_y).contains(&position.y)
    }

    /// Flip `active`. Either way the zone is rearmed.
    pub fn toggle(&mut self) {
        self.active = !self.active;
        self.triggered = false;
    }
}

fn min_max(a: f64, b: f64) -> (f64, f64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Mark every armed zone containing `position` as triggered.
///
/// Returns the indices of the zones that fired on this call.
pub fn evaluate(alarms: &mut [Alarm], position: RelativePoint) -> Vec<usize> {
    let mut fired = Vec::new();
    for (idx, alarm) in alarms.iter_mut().enumerate() {
        if alarm.is_armed() && alarm.contains(position) {
            alarm.triggered = true;
            fired.push(idx);
        }
    }
    fired
}
