//! WebSocket client for the message-bus bridge.
//!
//! The bridge relays bus messages as JSON text frames of the form
//! `{"topic": "<cameraId>/frame_metadata", "payload": {...}}`. On connect the
//! client sends a subscription request for all frame-metadata topics. The
//! connection is re-established with a fixed delay whenever it drops.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

use crate::decode::{decode_envelope, FrameMessage};

/// Topic filter covering every camera's frame metadata.
pub const FRAME_METADATA_FILTER: &str = "+/frame_metadata";

const DEFAULT_RECONNECT_DELAY_SECS: u64 = 3;

#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    /// `ws://` or `wss://` endpoint of the bridge.
    pub url: String,
    pub reconnect_delay: Duration,
    /// Passed to [`decode_envelope`].
    pub min_class_score: f64,
}

impl BridgeConfig {
    /// Load from environment variables.
    ///
    /// Returns `None` when `BUS_BRIDGE_URL` is unset, which disables ingestion.
    ///
    /// | Variable                    | Required | Default |
    /// |-----------------------------|----------|---------|
    /// | `BUS_BRIDGE_URL`            | yes      | -       |
    /// | `BUS_RECONNECT_DELAY_SECS`  | no       | `3`     |
    pub fn from_env(min_class_score: f64) -> Option<Self> {
        let url = std::env::var("BUS_BRIDGE_URL").ok()?;
        let secs = std::env::var("BUS_RECONNECT_DELAY_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_RECONNECT_DELAY_SECS);
        Some(Self {
            url,
            reconnect_delay: Duration::from_secs(secs),
            min_class_score,
        })
    }
}

/// Why a session ended.
enum SessionEnd {
    /// Connection lost; reconnect.
    Disconnected,
    /// Worker queue closed or shutdown requested; stop for good.
    Stop,
}

/// Relay frames from the bridge into `sender` until `cancel` fires or the
/// receiving side of `sender` is dropped.
pub async fn run(config: BridgeConfig, sender: mpsc::Sender<FrameMessage>, cancel: CancellationToken) {
    loop {
        tracing::info!(url = %config.url, "Connecting to bus bridge");

        let connected = tokio::select! {
            _ = cancel.cancelled() => break,
            result = connect_async(config.url.as_str()) => result,
        };

        match connected {
            Ok((ws_stream, _response)) => {
                tracing::info!("Bus bridge connected");
                match run_session(ws_stream, &config, &sender, &cancel).await {
                    SessionEnd::Stop => break,
                    SessionEnd::Disconnected => {
                        tracing::warn!("Bus bridge session ended, reconnecting");
                    }
                }
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    retry_in_secs = config.reconnect_delay.as_secs(),
                    "Bus bridge connection failed"
                );
            }
        }

        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(config.reconnect_delay) => {}
        }
    }
    tracing::info!("Bus bridge client stopped");
}

async fn run_session(
    ws_stream: tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    config: &BridgeConfig,
    sender: &mpsc::Sender<FrameMessage>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let (mut sink, mut stream) = ws_stream.split();

    let subscribe = serde_json::json!({ "subscribe": FRAME_METADATA_FILTER }).to_string();
    if let Err(e) = sink.send(Message::Text(subscribe)).await {
        tracing::error!(error = %e, "Failed to send subscription request");
        return SessionEnd::Disconnected;
    }

    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                return SessionEnd::Stop;
            }
            msg = stream.next() => msg,
        };

        match msg {
            Some(Ok(Message::Text(text))) => match decode_envelope(&text, config.min_class_score) {
                Ok(frame) => {
                    if sender.send(frame).await.is_err() {
                        tracing::info!("Frame queue closed, leaving bus bridge");
                        return SessionEnd::Stop;
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to decode bus message");
                }
            },
            Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
            Some(Ok(Message::Close(frame))) => {
                tracing::info!(?frame, "Bus bridge closed the connection");
                return SessionEnd::Disconnected;
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => {
                tracing::error!(error = %e, "Bus bridge receive error");
                return SessionEnd::Disconnected;
            }
            None => return SessionEnd::Disconnected,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;

    use super::*;

    #[test]
    fn from_env_is_disabled_without_url() {
        std::env::remove_var("BUS_BRIDGE_URL");
        assert!(BridgeConfig::from_env(0.85).is_none());
    }

    /// Accept one client, check its subscription, send one frame.
    async fn fake_bridge(listener: TcpListener) {
        let (tcp, _) = listener.accept().await.expect("accept");
        let mut ws = tokio_tungstenite::accept_async(tcp).await.expect("handshake");

        let Some(Ok(Message::Text(request))) = ws.next().await else {
            panic!("expected a subscription request");
        };
        let request: serde_json::Value = serde_json::from_str(&request).expect("json");
        assert_eq!(request["subscribe"], FRAME_METADATA_FILTER);

        let envelope = serde_json::json!({
            "topic": "cam-3/frame_metadata",
            "payload": {"frame": {"observations": [{"class": {"score": 0.97}}], "timestamp": "2025-04-02T08:18:12Z"}}
        });
        ws.send(Message::Text(envelope.to_string())).await.expect("send");
        // Keep the socket open until the client goes away.
        while let Some(Ok(_)) = ws.next().await {}
    }

    #[tokio::test]
    async fn relays_frames_from_the_bridge() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        tokio::spawn(fake_bridge(listener));

        let config = BridgeConfig {
            url: format!("ws://{addr}"),
            reconnect_delay: Duration::from_millis(50),
            min_class_score: 0.85,
        };
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        let client = tokio::spawn(run(config, tx, cancel.clone()));

        let frame = tokio::time::timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("frame in time")
            .expect("channel open");
        assert_eq!(frame.camera_id, "cam-3");
        assert_eq!(frame.observations.len(), 1);

        cancel.cancel();
        client.await.expect("client stops");
    }

    #[tokio::test]
    async fn cancellation_stops_reconnect_loop() {
        let config = BridgeConfig {
            url: "ws://127.0.0.1:9".to_string(),
            reconnect_delay: Duration::from_secs(60),
            min_class_score: 0.85,
        };
        let (tx, _rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        let client = tokio::spawn(run(config, tx, cancel.clone()));

        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(5), client)
            .await
            .expect("stops promptly")
            .expect("no panic");
    }
}
