//! Floor-plan configuration and geodetic-to-relative coordinate mapping.
//!
//! The floor-plan image is described by its four geodetic corners in the
//! winding order TL, TR, BR, BL. [`CoordinateMapper`] expresses any
//! geodetic point as a combination of the two image edges leaving the
//! top-left corner, so `(0, 0)` is TL, `(100, 0)` is TR and `(100, 100)` is
//! BR. Because it is a true change of basis, rotated or skewed floor plans
//! map correctly.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::geo::{round_to, GeoPoint, RelativePoint};
use crate::types::CameraId;

/// Metres per degree of latitude on the equirectangular approximation.
const METRES_PER_DEGREE: f64 = 111_320.0;

/// Smallest accepted floor-plan area in square metres. Anything below this
/// is numerically indistinguishable from collinear corners.
pub const MIN_DETERMINANT_M2: f64 = 0.01;

// ---------------------------------------------------------------------------
// Configuration document
// ---------------------------------------------------------------------------

/// Per-camera placement on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraPlacement {
    /// `[latitude, longitude]` of the camera.
    pub geocoordinates: [f64; 2],
    /// `[x, y]` position on the image in percent.
    #[serde(alias = "pixelPercent", alias = "relativePixelPercent")]
    pub pixel_percent: [f64; 2],
    /// Mounting height in metres.
    #[serde(default)]
    pub height: f64,
    /// Compass heading in degrees.
    #[serde(default)]
    pub heading: f64,
}

/// Static map description, loaded once per process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    pub name: String,
    /// Geodetic corners of the mapped area, `[lat, lon]` each.
    #[serde(default)]
    pub corners: Vec<[f64; 2]>,
    /// Geodetic corners of the rendered image: TL, TR, BR, BL.
    #[serde(alias = "imageCorners")]
    pub image_corners: [[f64; 2]; 4],
    #[serde(default)]
    pub cameras: BTreeMap<CameraId, CameraPlacement>,
}

/// Camera marker for display, in relative coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CameraMarker {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

// ---------------------------------------------------------------------------
// CoordinateMapper
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
struct Vec2 {
    x: f64,
    y: f64,
}

/// Maps geodetic points to relative (0-100) floor-plan coordinates.
#[derive(Debug, Clone)]
pub struct CoordinateMapper {
    name: String,
    origin: GeoPoint,
    lon_scale: f64,
    edge_u: Vec2,
    edge_v: Vec2,
    determinant: f64,
    cameras: BTreeMap<CameraId, CameraMarker>,
}

impl CoordinateMapper {
    /// Build a mapper from a map configuration.
    ///
    /// Fails with [`CoreError::Configuration`] when the image corners are
    /// not finite, collinear, or enclose (almost) no area.
    pub fn new(config: &MapConfig) -> Result<Self, CoreError> {
        let [tl, tr, _br, bl] = config.image_corners;
        let mut mapper = Self::from_corners(
            GeoPoint::new(tl[0], tl[1]),
            GeoPoint::new(tr[0], tr[1]),
            GeoPoint::new(bl[0], bl[1]),
        )?;
        mapper.name = config.name.clone();
        mapper.cameras = config
            .cameras
            .iter()
            .map(|(id, cam)| {
                (
                    id.clone(),
                    CameraMarker {
                        x: cam.pixel_percent[0],
                        y: cam.pixel_percent[1],
                        heading: cam.heading,
                    },
                )
            })
            .collect();
        Ok(mapper)
    }

    /// Build a mapper from the three corners that span the image.
    pub fn from_corners(
        top_left: GeoPoint,
        top_right: GeoPoint,
        bottom_left: GeoPoint,
    ) -> Result<Self, CoreError> {
        let all_finite = [top_left, top_right, bottom_left]
            .iter()
            .all(|p| p.latitude.is_finite() && p.longitude.is_finite());
        if !all_finite {
            return Err(CoreError::Configuration(
                "map corners must be finite coordinates".to_string(),
            ));
        }

        let lon_scale = top_left.latitude.to_radians().cos();
        let project = |p: GeoPoint| Vec2 {
            x: (p.longitude - top_left.longitude) * lon_scale * METRES_PER_DEGREE,
            y: (p.latitude - top_left.latitude) * METRES_PER_DEGREE,
        };

        let edge_u = project(top_right);
        let edge_v = project(bottom_left);
        let determinant = edge_u.x * edge_v.y - edge_u.y * edge_v.x;

        if !determinant.is_finite() || determinant.abs() < MIN_DETERMINANT_M2 {
            return Err(CoreError::Configuration(format!(
                "map corners are collinear or degenerate (determinant {determinant:.6} m^2)"
            )));
        }

        Ok(Self {
            name: String::new(),
            origin: top_left,
            lon_scale,
            edge_u,
            edge_v,
            determinant,
            cameras: BTreeMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Relative position of `point`, rounded to two decimals.
    ///
    /// Points outside the image map outside `[0, 100]`; callers clamp when
    /// they need to.
    pub fn to_relative(&self, point: GeoPoint) -> RelativePoint {
        let p = Vec2 {
            x: (point.longitude - self.origin.longitude) * self.lon_scale * METRES_PER_DEGREE,
            y: (point.latitude - self.origin.latitude) * METRES_PER_DEGREE,
        };

        // Cramer's rule for p = a * edge_u + b * edge_v.
        let a = (p.x * self.edge_v.y - p.y * self.edge_v.x) / self.determinant;
        let b = (self.edge_u.x * p.y - self.edge_u.y * p.x) / self.determinant;

        RelativePoint::new(round_to(a * 100.0, 2), round_to(b * 100.0, 2))
    }

    /// Camera markers keyed by camera id.
    pub fn camera_positions(&self) -> &BTreeMap<CameraId, CameraMarker> {
        &self.cameras
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const TL: [f64; 2] = [59.3250, 18.0700];
    const TR: [f64; 2] = [59.3250, 18.0710];
    const BR: [f64; 2] = [59.3240, 18.0710];
    const BL: [f64; 2] = [59.3240, 18.0700];

    fn square_map() -> MapConfig {
        MapConfig {
            name: "Test Room".to_string(),
            corners: vec![TL, TR, BR, BL],
            image_corners: [TL, TR, BR, BL],
            cameras: BTreeMap::from([(
                "1".to_string(),
                CameraPlacement {
                    geocoordinates: [59.3249, 18.0701],
                    pixel_percent: [12.5, 8.0],
                    height: 3.0,
                    heading: 135.0,
                },
            )]),
        }
    }

    fn assert_close(actual: RelativePoint, x: f64, y: f64) {
        assert!(
            (actual.x - x).abs() <= 0.5 && (actual.y - y).abs() <= 0.5,
            "expected ({x}, {y}), got ({}, {})",
            actual.x,
            actual.y
        );
    }

    #[test]
    fn corners_and_centre_of_axis_aligned_square() {
        let mapper = CoordinateMapper::new(&square_map()).expect("valid map");

        assert_close(mapper.to_relative(GeoPoint::new(TL[0], TL[1])), 0.0, 0.0);
        assert_close(mapper.to_relative(GeoPoint::new(TR[0], TR[1])), 100.0, 0.0);
        assert_close(mapper.to_relative(GeoPoint::new(BR[0], BR[1])), 100.0, 100.0);
        assert_close(mapper.to_relative(GeoPoint::new(BL[0], BL[1])), 0.0, 100.0);
        assert_close(mapper.to_relative(GeoPoint::new(59.3245, 18.0705)), 50.0, 50.0);
    }

    #[test]
    fn output_is_rounded_to_two_decimals() {
        let mapper = CoordinateMapper::new(&square_map()).expect("valid map");
        let p = mapper.to_relative(GeoPoint::new(59.32463, 18.07017));
        assert_eq!(p.x, round_to(p.x, 2));
        assert_eq!(p.y, round_to(p.y, 2));
    }

    #[test]
    fn rotated_floor_plan_maps_through_its_own_basis() {
        // Diamond: TL at west, TR at north, BL at south.
        let tl = GeoPoint::new(59.3245, 18.0700);
        let tr = GeoPoint::new(59.3250, 18.0705);
        let bl = GeoPoint::new(59.3240, 18.0705);
        let mapper = CoordinateMapper::from_corners(tl, tr, bl).expect("valid map");

        assert_close(mapper.to_relative(tr), 100.0, 0.0);
        assert_close(mapper.to_relative(bl), 0.0, 100.0);
        // BR of the diamond is the east vertex.
        assert_close(mapper.to_relative(GeoPoint::new(59.3245, 18.0710)), 100.0, 100.0);
    }

    #[test]
    fn points_outside_the_image_are_not_clamped() {
        let mapper = CoordinateMapper::new(&square_map()).expect("valid map");
        let p = mapper.to_relative(GeoPoint::new(59.3255, 18.0695));
        assert!(p.x < 0.0 && p.y < 0.0);
    }

    #[test]
    fn collinear_corners_are_rejected() {
        let tl = GeoPoint::new(59.3250, 18.0700);
        let tr = GeoPoint::new(59.3250, 18.0710);
        let bl = GeoPoint::new(59.3250, 18.0720);
        assert_matches!(
            CoordinateMapper::from_corners(tl, tr, bl),
            Err(CoreError::Configuration(_))
        );
    }

    #[test]
    fn coincident_corners_are_rejected() {
        let mut config = square_map();
        config.image_corners = [TL, TL, TL, TL];
        assert_matches!(CoordinateMapper::new(&config), Err(CoreError::Configuration(_)));
    }

    #[test]
    fn camera_markers_come_from_pixel_percent() {
        let mapper = CoordinateMapper::new(&square_map()).expect("valid map");
        let marker = mapper.camera_positions()["1"];
        assert_eq!(marker.x, 12.5);
        assert_eq!(marker.y, 8.0);
        assert_eq!(marker.heading, 135.0);
    }

    #[test]
    fn config_document_decodes_with_snake_case_keys() {
        let json = r#"{
            "name": "Local House",
            "corners": [[59.3250, 18.0700], [59.3250, 18.0710], [59.3240, 18.0710], [59.3240, 18.0700]],
            "image_corners": [[59.3250, 18.0700], [59.3250, 18.0710], [59.3240, 18.0710], [59.3240, 18.0700]],
            "cameras": {
                "3": {"geocoordinates": [59.3245, 18.0705], "pixel_percent": [50.0, 50.0], "height": 2.5, "heading": 90}
            }
        }"#;
        let config: MapConfig = serde_json::from_str(json).expect("valid map config");
        assert_eq!(config.name, "Local House");
        assert_eq!(config.cameras["3"].heading, 90.0);
        assert!(CoordinateMapper::new(&config).is_ok());
    }
}
