//! Bus message decoding.
//!
//! Cameras publish on `<cameraId>/frame_metadata` with a payload of the form
//! `{"frame": {"observations": [...], "timestamp": "..."}}`. Individual
//! observations that fail to decode are skipped; a broken frame is an error.

use eagleeye_core::observation::Observation;
use eagleeye_core::types::{CameraId, Timestamp};
use serde::Deserialize;

/// Topic suffix every frame-metadata message carries.
pub const FRAME_METADATA_SUFFIX: &str = "frame_metadata";

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("Unexpected topic: {0}")]
    Topic(String),

    #[error("Malformed payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// One camera's decoded detections for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameMessage {
    pub camera_id: CameraId,
    pub observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
struct FramePayload {
    frame: Frame,
}

#[derive(Debug, Deserialize)]
struct Frame {
    #[serde(default)]
    observations: Vec<serde_json::Value>,
    #[serde(default)]
    timestamp: Option<Timestamp>,
}

/// `{topic, payload}` as relayed by the bus bridge. `payload` is either the
/// frame object itself or a string holding its JSON text.
#[derive(Debug, Deserialize)]
struct Envelope {
    topic: String,
    payload: serde_json::Value,
}

/// Camera id from a `<cameraId>/frame_metadata` topic.
pub fn camera_id_from_topic(topic: &str) -> Result<CameraId, IngestError> {
    match topic.split_once('/') {
        Some((camera_id, FRAME_METADATA_SUFFIX)) if !camera_id.is_empty() => {
            Ok(camera_id.to_string())
        }
        _ => Err(IngestError::Topic(topic.to_string())),
    }
}

/// Decode one frame-metadata message.
///
/// Observations without a timestamp inherit the frame's. Observations whose
/// class score is present and not above `min_class_score` are discarded.
pub fn decode_frame(
    topic: &str,
    payload: serde_json::Value,
    min_class_score: f64,
) -> Result<FrameMessage, IngestError> {
    let camera_id = camera_id_from_topic(topic)?;
    let FramePayload { frame } = serde_json::from_value(payload)?;

    let total = frame.observations.len();
    let observations: Vec<Observation> = frame
        .observations
        .into_iter()
        .filter_map(|raw| match serde_json::from_value::<Observation>(raw) {
            Ok(obs) => Some(obs),
            Err(e) => {
                tracing::warn!(camera_id = %camera_id, error = %e, "Skipping malformed observation");
                None
            }
        })
        .filter(|obs| obs.class_score().map_or(true, |score| score > min_class_score))
        .map(|mut obs| {
            if obs.timestamp.is_none() {
                obs.timestamp = frame.timestamp;
            }
            obs
        })
        .collect();

    if observations.len() < total {
        tracing::trace!(
            camera_id = %camera_id,
            kept = observations.len(),
            total,
            "Low-confidence or malformed observations discarded"
        );
    }

    Ok(FrameMessage {
        camera_id,
        observations,
    })
}

/// Decode a bridge envelope (`{"topic": ..., "payload": ...}`).
pub fn decode_envelope(text: &str, min_class_score: f64) -> Result<FrameMessage, IngestError> {
    let Envelope { topic, payload } = serde_json::from_str(text)?;
    let payload = match payload {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)?,
        other => other,
    };
    decode_frame(&topic, payload, min_class_score)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use super::*;

    fn frame(observations: serde_json::Value) -> serde_json::Value {
        json!({
            "frame": {
                "observations": observations,
                "timestamp": "2025-04-02T08:18:12.678869Z"
            }
        })
    }

    #[test]
    fn camera_id_comes_from_the_topic_prefix() {
        assert_eq!(camera_id_from_topic("B8A44F3024BB/frame_metadata").expect("valid"), "B8A44F3024BB");
        assert_matches!(camera_id_from_topic("cam/other"), Err(IngestError::Topic(_)));
        assert_matches!(camera_id_from_topic("/frame_metadata"), Err(IngestError::Topic(_)));
        assert_matches!(camera_id_from_topic("frame_metadata"), Err(IngestError::Topic(_)));
    }

    #[test]
    fn low_confidence_detections_are_discarded() {
        let payload = frame(json!([
            {"class": {"type": "Human", "score": 0.92}},
            {"class": {"type": "Human", "score": 0.85}},
            {"class": {"type": "Human"}},
            {"bounding_box": {"left": 0.1, "top": 0.1, "right": 0.2, "bottom": 0.2}}
        ]));

        let message = decode_frame("1/frame_metadata", payload, 0.85).expect("decodes");
        assert_eq!(message.camera_id, "1");
        assert_eq!(message.observations.len(), 3);
        assert_eq!(message.observations[0].class_score(), Some(0.92));
    }

    #[test]
    fn missing_timestamps_inherit_the_frame_timestamp() {
        let payload = frame(json!([
            {"class": {"score": 0.9}},
            {"class": {"score": 0.9}, "timestamp": "2025-04-02T08:18:13Z"}
        ]));

        let message = decode_frame("1/frame_metadata", payload, 0.85).expect("decodes");
        let frame_ts = Utc
            .with_ymd_and_hms(2025, 4, 2, 8, 18, 12)
            .unwrap()
            + chrono::Duration::microseconds(678_869);
        assert_eq!(message.observations[0].timestamp, Some(frame_ts));
        assert_eq!(
            message.observations[1].timestamp,
            Some(Utc.with_ymd_and_hms(2025, 4, 2, 8, 18, 13).unwrap())
        );
    }

    #[test]
    fn malformed_observations_are_skipped_not_fatal() {
        let payload = frame(json!([
            {"class": {"score": "high"}},
            {"class": {"score": 0.99}}
        ]));
        let message = decode_frame("1/frame_metadata", payload, 0.85).expect("decodes");
        assert_eq!(message.observations.len(), 1);
    }

    #[test]
    fn payload_without_frame_is_an_error() {
        assert_matches!(
            decode_frame("1/frame_metadata", json!({"observations": []}), 0.85),
            Err(IngestError::Payload(_))
        );
    }

    #[test]
    fn envelope_accepts_object_and_string_payloads() {
        let inner = frame(json!([{"class": {"score": 0.9}}]));

        let as_object = json!({"topic": "2/frame_metadata", "payload": inner}).to_string();
        let as_string = json!({"topic": "2/frame_metadata", "payload": inner.to_string()}).to_string();

        let a = decode_envelope(&as_object, 0.85).expect("object payload");
        let b = decode_envelope(&as_string, 0.85).expect("string payload");
        assert_eq!(a, b);
        assert_eq!(a.camera_id, "2");
    }
}
