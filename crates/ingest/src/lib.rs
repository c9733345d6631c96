//! Ingestion adapter: camera frame metadata in, fused tracks out.
//!
//! Frames reach the backend through a WebSocket bridge in front of the
//! message bus ([`bridge`]). Each relayed message is decoded into a
//! [`FrameMessage`] ([`decode`]) and queued for the single
//! [`IngestionWorker`] that applies it to the shared tracker.

pub mod bridge;
pub mod decode;
pub mod worker;

pub use bridge::BridgeConfig;
pub use decode::{decode_envelope, decode_frame, FrameMessage, IngestError};
pub use worker::IngestionWorker;
