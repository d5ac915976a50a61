//! Periodic expiry of old orders and their stored files.
//!
//! Uploaded documents are held only long enough to be checked and the
//! reports collected. A background task deletes orders older than the
//! configured retention period, reports included, on a fixed interval.

use std::time::Duration;

use chrono::Utc;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use checkmate_db::repositories::OrderRepo;

use crate::handlers::orders::remove_order_files;

/// Default retention period: 5 hours.
const DEFAULT_RETENTION_HOURS: i64 = 5;

/// How often the cleanup job runs.
const CLEANUP_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the order expiry loop.
///
/// Deletes orders created more than `ORDER_RETENTION_HOURS` ago (defaults
/// to 5) together with their files. Runs until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    let retention_hours: i64 = std::env::var("ORDER_RETENTION_HOURS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_RETENTION_HOURS);

    tracing::info!(
        retention_hours,
        interval_secs = CLEANUP_INTERVAL.as_secs(),
        "Order cleanup job started"
    );

    let mut interval = tokio::time::interval(CLEANUP_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Order cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                let cutoff = Utc::now() - chrono::Duration::hours(retention_hours);
                match sweep(&pool, cutoff).await {
                    Ok(0) => tracing::debug!("Order cleanup: nothing to expire"),
                    Ok(deleted) => tracing::info!(deleted, "Order cleanup: expired old orders"),
                    Err(e) => tracing::error!(error = %e, "Order cleanup: sweep failed"),
                }
            }
        }
    }
}

/// Delete every order created before `cutoff`, removing its files first.
async fn sweep(pool: &PgPool, cutoff: chrono::DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let stale = OrderRepo::list_older_than(pool, cutoff).await?;
    let mut deleted = 0;
    for order in stale {
        remove_order_files(&order).await;
        if OrderRepo::delete(pool, order.id).await? {
            deleted += 1;
        }
    }
    Ok(deleted)
}
