use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use eagleeye_api::background::log_flush;
use eagleeye_api::config::{DataPaths, ServerConfig};
use eagleeye_api::router::build_app_router;
use eagleeye_api::state::AppState;
use eagleeye_core::map::CoordinateMapper;
use eagleeye_events::{AlarmNotificationService, EmailConfig, EmailDelivery, EventBus};
use eagleeye_fusion::{AlarmManager, FusionTracker, HeatmapAggregator, SharedTracker, TrackerConfig};
use eagleeye_ingest::worker::DEFAULT_QUEUE_CAPACITY;
use eagleeye_ingest::{bridge, BridgeConfig, IngestionWorker};
use eagleeye_store::map_config::load_map_config;
use eagleeye_store::repositories::{AlarmRepo, JsonlObservationLog, ObservationLog};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "eagleeye_api=debug,eagleeye_fusion=info,eagleeye_ingest=info,eagleeye_events=info,tower_http=debug"
                    .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env();
    let paths = DataPaths::from_env();
    let tracker_config = TrackerConfig::from_env();
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Floor plan ---
    let map_config = or_exit(load_map_config(&paths.map_config), "Failed to load map configuration");
    let mapper = Arc::new(or_exit(
        CoordinateMapper::new(&map_config),
        "Map configuration is unusable",
    ));
    tracing::info!(
        map = %mapper.name(),
        cameras = mapper.camera_positions().len(),
        "Coordinate mapper ready"
    );

    // --- Event bus ---
    let event_bus = Arc::new(EventBus::default());

    let email = EmailConfig::from_env().map(EmailDelivery::new);
    if email.is_none() {
        tracing::info!("SMTP_HOST or ALARM_RECIPIENT not set, alarm email disabled");
    }
    let notifier_handle = tokio::spawn(AlarmNotificationService::new(email).run(event_bus.subscribe()));

    // --- Alarms and tracker ---
    let alarms = Arc::new(or_exit(
        AlarmManager::load(AlarmRepo::new(&paths.alarms), Arc::clone(&event_bus)),
        "Failed to load alarms",
    ));

    let log: Arc<dyn ObservationLog> = Arc::new(JsonlObservationLog::new(&paths.heatmap_log));
    let flush_interval = tracker_config
        .flush_interval
        .to_std()
        .unwrap_or(log_flush::FLUSH_INTERVAL);
    let min_class_score = tracker_config.min_class_score;

    let tracker = SharedTracker::new(FusionTracker::new(
        tracker_config,
        Arc::clone(&mapper),
        Arc::clone(&alarms),
        Arc::clone(&log),
    ));
    let heatmap = HeatmapAggregator::new(log, Arc::clone(&mapper));

    // --- Ingestion ---
    let cancel = CancellationToken::new();
    let (frame_tx, frame_rx) = tokio::sync::mpsc::channel(DEFAULT_QUEUE_CAPACITY);

    let worker_handle = tokio::spawn(IngestionWorker::new(tracker.clone()).run(frame_rx, cancel.clone()));

    let bridge_handle = match BridgeConfig::from_env(min_class_score) {
        Some(bridge_config) => Some(tokio::spawn(bridge::run(bridge_config, frame_tx, cancel.clone()))),
        None => {
            tracing::warn!("BUS_BRIDGE_URL not set, ingestion disabled");
            drop(frame_tx);
            None
        }
    };

    let flush_handle = tokio::spawn(log_flush::run(tracker.clone(), flush_interval, cancel.clone()));

    tracing::info!("Background services started (notifier, ingestion, log flush)");

    // --- Router ---
    let state = AppState {
        config: Arc::new(config.clone()),
        tracker: tracker.clone(),
        mapper,
        alarms: Arc::clone(&alarms),
        heatmap,
    };
    let app = build_app_router(state, &config);

    // --- Start server ---
    let host: IpAddr = or_exit(config.host.parse(), "Invalid HOST address");
    let addr = SocketAddr::new(host, config.port);
    tracing::info!(%addr, "Starting server");

    let listener = or_exit(
        tokio::net::TcpListener::bind(addr).await,
        "Failed to bind to address",
    );

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");
    let grace = Duration::from_secs(config.shutdown_timeout_secs);

    cancel.cancel();
    if let Some(handle) = bridge_handle {
        let _ = tokio::time::timeout(grace, handle).await;
    }
    match tokio::time::timeout(grace, worker_handle).await {
        Ok(Ok(applied)) => tracing::info!(applied, "Ingestion worker stopped"),
        _ => tracing::warn!("Ingestion worker did not stop cleanly"),
    }
    let _ = tokio::time::timeout(grace, flush_handle).await;

    match tracker.flush(Utc::now()).await {
        Ok(written) => tracing::info!(written, "Final observation buffer flush"),
        Err(e) => tracing::error!(error = %e, "Final observation buffer flush failed"),
    }

    // The tracker and the alarm manager hold the last bus senders. Dropping
    // them closes the channel and lets the notifier drain and exit.
    drop(tracker);
    drop(alarms);
    drop(event_bus);
    match tokio::time::timeout(grace, notifier_handle).await {
        Ok(Ok(notified)) => tracing::info!(notified, "Alarm notifier stopped"),
        _ => tracing::warn!("Alarm notifier did not stop cleanly"),
    }

    tracing::info!("Graceful shutdown complete");
}

/// Unwrap a startup result or log it and exit the process.
fn or_exit<T, E: std::fmt::Display>(result: Result<T, E>, context: &str) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(error = %e, "{context}");
            std::process::exit(1);
        }
    }
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl-C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
