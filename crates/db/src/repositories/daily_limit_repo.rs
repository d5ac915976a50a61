//! Repository for the `daily_limits` table.
//!
//! The quota row for a day is created on demand with `max_uploads = 0`, so
//! an unconfigured day admits nothing (fail closed). Admission itself is a
//! single conditional increment; see [`DailyLimitRepo::try_admit`].

use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};

use crate::models::daily_limit::DailyLimit;

const COLUMNS: &str = "id, day, max_uploads, current_uploads, created_at, updated_at";

/// Provides quota reads, the admin cap edit, and the atomic admission step.
pub struct DailyLimitRepo;

impl DailyLimitRepo {
    /// Fetch the quota row for `day`, creating it (cap 0) when absent.
    ///
    /// The upsert tolerates a concurrent insert of the same day.
    pub async fn get_or_create(pool: &PgPool, day: NaiveDate) -> Result<DailyLimit, sqlx::Error> {
        let query = format!(
            "INSERT INTO daily_limits (day) VALUES ($1)
             ON CONFLICT (day) DO UPDATE SET day = EXCLUDED.day
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DailyLimit>(&query)
            .bind(day)
            .fetch_one(pool)
            .await
    }

    /// Set the absolute cap for `day`, creating the row when absent.
    ///
    /// Usage (`current_uploads`) is never touched by a cap edit.
    pub async fn set_max_uploads(
        pool: &PgPool,
        day: NaiveDate,
        max_uploads: i32,
    ) -> Result<DailyLimit, sqlx::Error> {
        let query = format!(
            "INSERT INTO daily_limits (day, max_uploads) VALUES ($1, $2)
             ON CONFLICT (day) DO UPDATE
                 SET max_uploads = EXCLUDED.max_uploads, updated_at = now()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, DailyLimit>(&query)
            .bind(day)
            .bind(max_uploads)
            .fetch_one(pool)
            .await
    }

    /// Atomically claim one upload slot for `day` inside an open transaction.
    ///
    /// The check and the increment are a single conditional UPDATE, so
    /// concurrent uploads can never jointly exceed the cap. Returns `false`
    /// when the day is at (or past) its cap or has no quota row at all.
    pub async fn try_admit(
        tx: &mut Transaction<'_, Postgres>,
        day: NaiveDate,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE daily_limits
             SET current_uploads = current_uploads + 1, updated_at = now()
             WHERE day = $1 AND current_uploads < max_uploads",
        )
        .bind(day)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
