//! Periodic purge of expired OTP codes and password-reset tokens.

use std::time::Duration;

use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

use checkmate_db::repositories::AuthTokenRepo;

/// How often the purge runs.
const PURGE_INTERVAL: Duration = Duration::from_secs(3600); // 1 hour

/// Run the token purge loop until `cancel` is triggered.
pub async fn run(pool: PgPool, cancel: CancellationToken) {
    tracing::info!(
        interval_secs = PURGE_INTERVAL.as_secs(),
        "Token cleanup job started"
    );

    let mut interval = tokio::time::interval(PURGE_INTERVAL);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Token cleanup job stopping");
                break;
            }
            _ = interval.tick() => {
                match AuthTokenRepo::purge_expired(&pool).await {
                    Ok(0) => tracing::debug!("Token cleanup: nothing expired"),
                    Ok(purged) => tracing::info!(purged, "Token cleanup: purged expired tokens"),
                    Err(e) => tracing::error!(error = %e, "Token cleanup: purge failed"),
                }
            }
        }
    }
}
