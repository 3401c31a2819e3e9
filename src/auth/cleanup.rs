//! Background worker that deletes expired sessions.

use sqlx::SqlitePool;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Run a single cleanup cycle. Returns the number of sessions removed.
pub async fn cleanup_once(pool: &SqlitePool) -> u64 {
    let now = chrono::Utc::now().to_rfc3339();
    match crate::db::delete_expired_sessions(pool, &now).await {
        Ok(count) => {
            if count > 0 {
                tracing::info!(expired_sessions = count, "Cleaned up expired sessions");
            }
            count
        }
        Err(e) => {
            tracing::error!("Failed to delete expired sessions: {e:#}");
            0
        }
    }
}

/// Run the cleanup worker.
/// This task runs cleanup immediately on start, then every `interval`,
/// until `shutdown` is cancelled.
pub async fn run_cleanup_worker(pool: SqlitePool, interval: Duration, shutdown: CancellationToken) {
    tracing::info!(
        interval_secs = interval.as_secs(),
        "Starting session cleanup worker"
    );

    cleanup_once(&pool).await;

    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // first tick is immediate; we already ran

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cleanup_once(&pool).await;
            }
            () = shutdown.cancelled() => {
                tracing::info!("Session cleanup worker shutting down");
                break;
            }
        }
    }
}
