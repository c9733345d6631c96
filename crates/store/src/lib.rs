//! File-backed persistence for the EagleEye backend.
//!
//! - [`repositories::AlarmRepo`]: the alarm-zone list, one JSON document
//!   rewritten in full on every mutation.
//! - [`repositories::ObservationLog`]: the append-only observation stream
//!   feeding the heatmap, with a JSON-Lines file implementation and an
//!   in-memory one.
//! - [`map_config::load_map_config`]: reads the static floor-plan document.

pub mod error;
pub mod map_config;
pub mod repositories;

pub use error::StoreError;
