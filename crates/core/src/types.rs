/// Camera identifiers are taken verbatim from the bus topic prefix.
pub type CameraId = String;

/// Global objects are identified by a random UUID assigned at creation.
pub type ObjectId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
