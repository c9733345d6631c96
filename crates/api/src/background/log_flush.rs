//! Periodic flush of the tracker's buffered log records.
//!
//! The tracker flushes opportunistically while frames arrive. This task
//! covers quiet periods so buffered records still reach the heatmap log.

use std::time::Duration;

use chrono::Utc;
use eagleeye_fusion::SharedTracker;
use tokio_util::sync::CancellationToken;

/// How often the flush job runs.
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(5);

/// Run the flush loop until `cancel` is triggered.
pub async fn run(tracker: SharedTracker, interval: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = interval.as_secs(), "Log flush job started");

    let mut ticker = tokio::time::interval(interval);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Log flush job stopping");
                break;
            }
            _ = ticker.tick() => {
                match tracker.flush(Utc::now()).await {
                    Ok(0) => tracing::trace!("Log flush: nothing buffered"),
                    Ok(written) => tracing::debug!(written, "Log flush: records appended"),
                    Err(e) => tracing::error!(error = %e, "Log flush failed"),
                }
            }
        }
    }
}
