//! Repository for Web Push subscriptions.

use sqlx::PgPool;

use checkmate_core::types::DbId;

use crate::models::push_subscription::{PushSubscription, SubscriptionPayload};

const COLUMNS: &str = "id, user_id, endpoint, p256dh, auth_secret, created_at, updated_at";

pub struct PushSubscriptionRepo;

impl PushSubscriptionRepo {
    /// Upsert on endpoint: re-subscribing the same browser refreshes the
    /// keys and ownership instead of growing duplicates.
    pub async fn upsert(
        pool: &PgPool,
        user_id: DbId,
        payload: &SubscriptionPayload,
    ) -> Result<PushSubscription, sqlx::Error> {
        let query = format!(
            "INSERT INTO push_subscriptions (user_id, endpoint, p256dh, auth_secret)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (endpoint) DO UPDATE SET
                 user_id = EXCLUDED.user_id,
                 p256dh = EXCLUDED.p256dh,
                 auth_secret = EXCLUDED.auth_secret,
                 updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PushSubscription>(&query)
            .bind(user_id)
            .bind(&payload.endpoint)
            .bind(&payload.keys.p256dh)
            .bind(&payload.keys.auth)
            .fetch_one(pool)
            .await
    }

    /// All subscriptions belonging to admin users, the dispatch fan-out
    /// set.
    pub async fn list_for_admins(pool: &PgPool) -> Result<Vec<PushSubscription>, sqlx::Error> {
        sqlx::query_as::<_, PushSubscription>(
            "SELECT s.id, s.user_id, s.endpoint, s.p256dh, s.auth_secret, s.created_at, s.updated_at
             FROM push_subscriptions s
             JOIN users u ON u.id = s.user_id
             WHERE u.is_admin = TRUE",
        )
        .fetch_all(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM push_subscriptions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Unsubscribe: drop a user's subscription by endpoint.
    pub async fn delete_by_endpoint(
        pool: &PgPool,
        user_id: DbId,
        endpoint: &str,
    ) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM push_subscriptions WHERE user_id = $1 AND endpoint = $2")
                .bind(user_id)
                .bind(endpoint)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }
}
