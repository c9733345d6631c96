#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use chrono::{DateTime, Utc};
use http_body_util::BodyExt;
use tower::ServiceExt;

use eagleeye_api::config::ServerConfig;
use eagleeye_api::router::build_app_router;
use eagleeye_api::state::AppState;
use eagleeye_core::map::{CameraPlacement, CoordinateMapper, MapConfig};
use eagleeye_core::observation::{
    BoundingBox, Classification, ColorScore, Geoposition, ObjectType, Observation,
};
use eagleeye_events::EventBus;
use eagleeye_fusion::{AlarmManager, FusionTracker, HeatmapAggregator, SharedTracker, TrackerConfig};
use eagleeye_store::repositories::{AlarmRepo, MemoryObservationLog};

/// Centre of the test floor plan.
pub const CENTRE: (f64, f64) = (59.3245, 18.0705);

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 5,
    }
}

/// Axis-aligned square floor plan with one camera in its top-left quadrant.
pub fn test_map() -> MapConfig {
    let mut cameras = BTreeMap::new();
    cameras.insert(
        "1".to_string(),
        CameraPlacement {
            geocoordinates: [59.3248, 18.0702],
            pixel_percent: [25.0, 30.0],
            height: 3.0,
            heading: 90.0,
        },
    );
    MapConfig {
        name: "test-floor".to_string(),
        corners: Vec::new(),
        image_corners: [
            [59.3250, 18.0700],
            [59.3250, 18.0710],
            [59.3240, 18.0710],
            [59.3240, 18.0700],
        ],
        cameras,
    }
}

/// Handles a test needs next to the router.
pub struct TestApp {
    pub router: Router,
    pub tracker: SharedTracker,
    pub log: Arc<MemoryObservationLog>,
    pub bus: Arc<EventBus>,
    _dir: tempfile::TempDir,
}

impl TestApp {
    /// A fresh clone of the router for one `oneshot` call.
    pub fn app(&self) -> Router {
        self.router.clone()
    }
}

/// Build the full application router with all middleware layers, backed by
/// a temporary alarm file and an in-memory observation log.
pub fn build_test_app() -> TestApp {
    let config = test_config();
    let dir = tempfile::tempdir().expect("tempdir");
    let bus = Arc::new(EventBus::default());

    let mapper = Arc::new(CoordinateMapper::new(&test_map()).expect("valid map"));
    let alarms = Arc::new(
        AlarmManager::load(AlarmRepo::new(dir.path().join("alarms.json")), Arc::clone(&bus))
            .expect("alarms"),
    );
    let log = Arc::new(MemoryObservationLog::new());
    let tracker = SharedTracker::new(FusionTracker::new(
        TrackerConfig::default(),
        Arc::clone(&mapper),
        Arc::clone(&alarms),
        log.clone(),
    ));
    let heatmap = HeatmapAggregator::new(log.clone(), Arc::clone(&mapper));

    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: tracker.clone(),
        mapper,
        alarms,
        heatmap,
    };

    TestApp {
        router: build_app_router(state, &config),
        tracker,
        log,
        bus,
        _dir: dir,
    }
}

/// A confidently classified person at `(lat, lon)`.
pub fn observation_at(lat: f64, lon: f64, at: DateTime<Utc>) -> Observation {
    Observation {
        timestamp: Some(at),
        classification: Some(Classification {
            kind: Some(ObjectType::Human),
            score: Some(0.93),
            upper_clothing_colors: vec![ColorScore::new("Gray", 0.7)],
            lower_clothing_colors: vec![ColorScore::new("Black", 0.6)],
        }),
        bounding_box: Some(BoundingBox::new(0.40, 0.30, 0.55, 0.60)),
        geoposition: Some(Geoposition::new(lat, lon)),
        camera_id: None,
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    };
    app.oneshot(request).await.expect("response")
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn delete(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("body")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}
