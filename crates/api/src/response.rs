//! Response bodies shared by several handlers.
//!
//! The floor-plan frontend expects each collection under a named key
//! (`{"objects": [...]}`, `{"alarms": [...]}`) rather than a generic
//! envelope, so the wrappers here are per-resource.

use serde::Serialize;

/// `{"message": "..."}` acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

impl MessageResponse {
    pub fn new(message: &'static str) -> Self {
        Self { message }
    }
}

/// An object placed on the floor plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedObject {
    pub x: f64,
    pub y: f64,
    pub id: String,
}
