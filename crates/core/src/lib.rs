//! EagleEye domain core.
//!
//! Pure logic with no I/O: the observation model, geodesy helpers, the
//! similarity scorer, the global-object track, the floor-plan coordinate
//! mapper, alarm zones and the heatmap grid. Everything here is
//! deterministic given its inputs, including "now".

pub mod alarm;
pub mod error;
pub mod geo;
pub mod global_object;
pub mod heatmap;
pub mod map;
pub mod observation;
pub mod similarity;
pub mod types;
