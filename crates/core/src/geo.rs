//! Geodetic and floor-plan coordinate primitives.

use ::geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};

/// A valid WGS84 position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance to `other` in metres.
    pub fn distance_m(&self, other: &GeoPoint) -> f64 {
        self.to_point().haversine_distance(&other.to_point())
    }

    fn to_point(self) -> Point<f64> {
        Point::new(self.longitude, self.latitude)
    }
}

/// A position on the floor plan, as percentages (0-100) of the image span.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelativePoint {
    pub x: f64,
    pub y: f64,
}

impl RelativePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Round `value` to `decimals` decimal places.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn distance_to_self_is_zero() {
        let p = GeoPoint::new(59.3250, 18.0700);
        assert_eq!(p.distance_m(&p), 0.0);
    }

    #[test]
    fn one_millidegree_of_latitude_is_about_111_metres() {
        let a = GeoPoint::new(59.3250, 18.0700);
        let b = GeoPoint::new(59.3240, 18.0700);
        let d = a.distance_m(&b);
        assert!((d - 111.19).abs() < 0.5, "got {d}");
    }

    #[test]
    fn longitude_distance_shrinks_with_latitude() {
        let a = GeoPoint::new(59.3250, 18.0700);
        let b = GeoPoint::new(59.3250, 18.0710);
        let d = a.distance_m(&b);
        // cos(59.325 deg) * 111.19 m
        assert!((d - 56.77).abs() < 0.5, "got {d}");
    }

    #[test]
    fn distance_is_symmetric() {
        let a = GeoPoint::new(59.3250, 18.0700);
        let b = GeoPoint::new(59.3241, 18.0709);
        assert!((a.distance_m(&b) - b.distance_m(&a)).abs() < 1e-9);
    }

    #[test]
    fn round_to_two_and_three_decimals() {
        assert_eq!(round_to(12.3456, 2), 12.35);
        assert_eq!(round_to(1.0 / 3.0, 3), 0.333);
    }
}
