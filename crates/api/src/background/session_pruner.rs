//! Periodic removal of abandoned intake sessions.
//!
//! Applicants who close the tab never discard their session. This task
//! drops sessions idle for longer than the configured TTL on a fixed
//! interval using `tokio::time::interval`.

use std::time::Duration;

use fellowship_pipeline::IntakeSessions;
use tokio_util::sync::CancellationToken;

/// How often the pruner runs.
const PRUNE_INTERVAL: Duration = Duration::from_secs(300);

/// Run the pruning loop until `cancel` is triggered.
pub async fn run(sessions: IntakeSessions, ttl: Duration, cancel: CancellationToken) {
    tracing::info!(
        ttl_secs = ttl.as_secs(),
        interval_secs = PRUNE_INTERVAL.as_secs(),
        "Intake session pruner started"
    );

    let mut interval = tokio::time::interval(PRUNE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Intake session pruner stopping");
                break;
            }
            _ = interval.tick() => {
                let pruned = sessions.prune_idle(ttl).await;
                if pruned > 0 {
                    tracing::info!(pruned, "Pruned idle intake sessions");
                } else {
                    tracing::debug!("No idle intake sessions to prune");
                }
            }
        }
    }
}
