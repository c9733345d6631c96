//! Per-camera detection model.
//!
//! Field names follow the camera's frame-metadata wire format. Every
//! attribute is optional: cameras routinely omit classification details,
//! bounding boxes or the geoposition, and the rest of the system has to
//! degrade gracefully rather than reject the detection.

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;
use crate::types::{CameraId, Timestamp};

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Detected object kind. Kinds the analytics do not know about are kept
/// verbatim so they still participate in exact-match comparisons.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectType {
    Human,
    Vehicle,
    Animal,
    #[serde(untagged)]
    Other(String),
}

/// One ranked colour guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorScore {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

impl ColorScore {
    pub fn new(name: impl Into<String>, score: f64) -> Self {
        Self {
            name: name.into(),
            score: Some(score),
        }
    }
}

/// Classifier output attached to a detection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ObjectType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Upper-body colours, best guess first.
    #[serde(
        default,
        alias = "upperColors",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub upper_clothing_colors: Vec<ColorScore>,

    /// Lower-body colours, best guess first.
    #[serde(
        default,
        alias = "lowerColors",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub lower_clothing_colors: Vec<ColorScore>,
}

impl Classification {
    pub fn top_upper_color(&self) -> Option<&str> {
        self.upper_clothing_colors.first().map(|c| c.name.as_str())
    }

    pub fn top_lower_color(&self) -> Option<&str> {
        self.lower_clothing_colors.first().map(|c| c.name.as_str())
    }
}

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Bounding box normalized to `[0, 1]` of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl BoundingBox {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn area(&self) -> f64 {
        (self.right - self.left).max(0.0) * (self.bottom - self.top).max(0.0)
    }

    /// Intersection over union with `other`; `0.0` when disjoint or degenerate.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let x1 = self.left.max(other.left);
        let y1 = self.top.max(other.top);
        let x2 = self.right.min(other.right);
        let y2 = self.bottom.min(other.bottom);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = self.area() + other.area() - intersection;

        if union > 0.0 {
            intersection / union
        } else {
            0.0
        }
    }
}

/// Geoposition as reported on the wire. Either coordinate may be null.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Geoposition {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

impl Geoposition {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude: Some(latitude),
            longitude: Some(longitude),
        }
    }

    /// The position as a usable point, if both coordinates are present and finite.
    pub fn point(&self) -> Option<GeoPoint> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) if lat.is_finite() && lon.is_finite() => {
                Some(GeoPoint::new(lat, lon))
            }
            _ => None,
        }
    }
}

impl From<GeoPoint> for Geoposition {
    fn from(p: GeoPoint) -> Self {
        Self::new(p.latitude, p.longitude)
    }
}

// ---------------------------------------------------------------------------
// Observation
// ---------------------------------------------------------------------------

/// One detection from one camera at one instant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    #[serde(default)]
    pub timestamp: Option<Timestamp>,

    #[serde(rename = "class", default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<Classification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geoposition: Option<Geoposition>,

    /// Attached by the ingestion boundary, never by the sensor.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera_id: Option<CameraId>,
}

impl Observation {
    /// Valid geoposition, if any.
    pub fn position(&self) -> Option<GeoPoint> {
        self.geoposition.as_ref().and_then(Geoposition::point)
    }

    pub fn has_valid_geoposition(&self) -> bool {
        self.position().is_some()
    }

    pub fn object_type(&self) -> Option<&ObjectType> {
        self.classification.as_ref().and_then(|c| c.kind.as_ref())
    }

    pub fn class_score(&self) -> Option<f64> {
        self.classification.as_ref().and_then(|c| c.score)
    }

    pub fn with_camera(mut self, camera_id: impl Into<CameraId>) -> Self {
        self.camera_id = Some(camera_id.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
