//! Repository for the `orders` table, including the composite upload
//! admission flow and the guarded lifecycle transitions.

use chrono::NaiveDate;
use sqlx::PgPool;

use checkmate_core::types::{DbId, Timestamp};

use crate::models::order::{CreateOrder, Order, OrderWithOwner};

use super::{CreditRepo, DailyLimitRepo};

const COLUMNS: &str = "id, user_id, payment_ref, status, original_filename, stored_file_path, \
                       ai_score, sim_score, report1_path, report2_path, created_at, updated_at";

/// Why an upload was refused admission.
///
/// Both gates are evaluated inside the same transaction as the order
/// insert, so a refusal leaves no trace: neither counter moves.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionError {
    /// The global daily cap is exhausted (or unconfigured for today).
    #[error("daily upload quota exhausted")]
    QuotaExceeded,

    /// The user has no slots remaining.
    #[error("no upload slots remaining")]
    InsufficientCredits,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Provides order CRUD, admission, and lifecycle transitions.
pub struct OrderRepo;

impl OrderRepo {
    /// Admit an upload: claim a daily-quota slot, reserve a user credit,
    /// and insert the order — all in one transaction.
    ///
    /// Either gate failing rolls everything back, so concurrent uploads can
    /// bypass neither the global cap nor the per-user balance.
    pub async fn admit_upload(
        pool: &PgPool,
        day: NaiveDate,
        input: &CreateOrder,
    ) -> Result<Order, AdmissionError> {
        let mut tx = pool.begin().await?;

        if !DailyLimitRepo::try_admit(&mut tx, day).await? {
            return Err(AdmissionError::QuotaExceeded);
        }
        if !CreditRepo::try_reserve_slot(&mut tx, input.user_id).await? {
            return Err(AdmissionError::InsufficientCredits);
        }

        let query = format!(
            "INSERT INTO orders (user_id, payment_ref, original_filename, stored_file_path)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        let order = sqlx::query_as::<_, Order>(&query)
            .bind(input.user_id)
            .bind(&input.payment_ref)
            .bind(&input.original_filename)
            .bind(&input.stored_file_path)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Find an order by ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE id = $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List one user's orders, newest first.
    pub async fn list_by_user(pool: &PgPool, user_id: DbId) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE user_id = $1 ORDER BY created_at DESC");
        sqlx::query_as::<_, Order>(&query)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// Admin listing: all orders joined with owner info, newest first.
    pub async fn list_with_owner(pool: &PgPool) -> Result<Vec<OrderWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, OrderWithOwner>(
            "SELECT o.id, o.user_id, o.status, o.original_filename,
                    o.ai_score, o.sim_score, o.report1_path, o.report2_path, o.created_at,
                    u.email AS owner_email,
                    u.first_name AS owner_first_name,
                    u.last_name AS owner_last_name
             FROM orders o
             JOIN users u ON u.id = o.user_id
             ORDER BY o.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }

    /// Transition `Pending -> Processing`.
    ///
    /// The guard is in the UPDATE itself: a non-Pending order is left
    /// untouched and `false` is returned (the caller distinguishes
    /// wrong-state from not-found by fetching the row).
    pub async fn start_processing(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE orders SET status = 'Processing', updated_at = now()
             WHERE id = $1 AND status = 'Pending'",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Attach report paths to an order still in `Processing`.
    ///
    /// `None` leaves the existing path in place, so a retried completion
    /// attempt does not lose previously uploaded reports.
    pub async fn attach_reports(
        pool: &PgPool,
        id: DbId,
        report1_path: Option<&str>,
        report2_path: Option<&str>,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders
             SET report1_path = COALESCE($2, report1_path),
                 report2_path = COALESCE($3, report2_path),
                 updated_at = now()
             WHERE id = $1 AND status = 'Processing'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(report1_path)
            .bind(report2_path)
            .fetch_optional(pool)
            .await
    }

    /// Transition `Processing -> Completed`, persisting both scores.
    ///
    /// The caller must have validated scores and ensured both report paths
    /// are attached; the `status = 'Processing'` guard plus the table CHECK
    /// constraints make it impossible to complete twice or to complete a
    /// report-less order.
    pub async fn complete(
        pool: &PgPool,
        id: DbId,
        ai_score: i32,
        sim_score: i32,
    ) -> Result<Option<Order>, sqlx::Error> {
        let query = format!(
            "UPDATE orders
             SET status = 'Completed', ai_score = $2, sim_score = $3, updated_at = now()
             WHERE id = $1 AND status = 'Processing'
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(ai_score)
            .bind(sim_score)
            .fetch_optional(pool)
            .await
    }

    /// Delete an order row. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Does the user own any order referencing this stored basename
    /// (document or either report)? Used by the download ownership check.
    pub async fn user_owns_file(
        pool: &PgPool,
        user_id: DbId,
        basename: &str,
    ) -> Result<bool, sqlx::Error> {
        let pattern = format!("%{basename}");
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM orders
             WHERE user_id = $1
               AND (stored_file_path LIKE $2
                    OR report1_path LIKE $2
                    OR report2_path LIKE $2)",
        )
        .bind(user_id)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }

    /// Resolve a client-supplied original filename to the stored basename.
    ///
    /// Stored names carry a `{user_id}_{ts}_` (or `report_{order_id}_{ts}_`)
    /// prefix, so a request for the original name finds them by suffix,
    /// newest order first. `user_id` scopes the search to one owner; `None`
    /// searches every order (admin downloads).
    pub async fn resolve_stored_name(
        pool: &PgPool,
        user_id: Option<DbId>,
        original: &str,
    ) -> Result<Option<String>, sqlx::Error> {
        let suffix = format!("_{original}");
        let pattern = format!("%{suffix}");
        let row: Option<(String, Option<String>, Option<String>)> = match user_id {
            Some(user_id) => {
                sqlx::query_as(
                    "SELECT stored_file_path, report1_path, report2_path FROM orders
                     WHERE user_id = $1
                       AND (stored_file_path LIKE $2
                            OR report1_path LIKE $2
                            OR report2_path LIKE $2)
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1",
                )
                .bind(user_id)
                .bind(&pattern)
                .fetch_optional(pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT stored_file_path, report1_path, report2_path FROM orders
                     WHERE stored_file_path LIKE $1
                        OR report1_path LIKE $1
                        OR report2_path LIKE $1
                     ORDER BY created_at DESC, id DESC
                     LIMIT 1",
                )
                .bind(&pattern)
                .fetch_optional(pool)
                .await?
            }
        };

        Ok(row.and_then(|(document, report1, report2)| {
            [Some(document), report1, report2]
                .into_iter()
                .flatten()
                .find(|path| path.ends_with(&suffix))
                .map(|path| match path.rsplit_once('/') {
                    Some((_, base)) => base.to_string(),
                    None => path,
                })
        }))
    }

    /// Fetch orders created before `cutoff` (expiry cleanup candidates).
    pub async fn list_older_than(
        pool: &PgPool,
        cutoff: Timestamp,
    ) -> Result<Vec<Order>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM orders WHERE created_at < $1");
        sqlx::query_as::<_, Order>(&query)
            .bind(cutoff)
            .fetch_all(pool)
            .await
    }
}
