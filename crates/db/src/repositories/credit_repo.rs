//! Repository for the `user_credits` ledger.
//!
//! The balance only ever moves through conditional updates: reservation
//! decrements with a `slots_remaining > 0` guard, grants upsert. The table
//! CHECK constraints back these up, but under normal operation they never
//! fire.

use sqlx::{PgPool, Postgres, Transaction};

use checkmate_core::types::DbId;

use crate::models::user_credits::{CreditBalance, UserCredits};

const COLUMNS: &str = "id, user_id, slots_remaining, total_purchased, created_at, updated_at";

/// Provides balance reads, slot reservation, and slot grants.
pub struct CreditRepo;

impl CreditRepo {
    /// Current balance for a user; all zeroes when no ledger row exists.
    pub async fn balance(pool: &PgPool, user_id: DbId) -> Result<CreditBalance, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM user_credits WHERE user_id = $1");
        let row = sqlx::query_as::<_, UserCredits>(&query)
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
        Ok(row.map_or_else(CreditBalance::default, |c| CreditBalance {
            slots_remaining: c.slots_remaining,
            total_purchased: c.total_purchased,
        }))
    }

    /// Atomically consume one slot inside an open transaction.
    ///
    /// Returns `false` when the user has no ledger row or no slots left;
    /// the balance can never go negative.
    pub async fn try_reserve_slot(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE user_credits
             SET slots_remaining = slots_remaining - 1, updated_at = now()
             WHERE user_id = $1 AND slots_remaining > 0",
        )
        .bind(user_id)
        .execute(&mut **tx)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Grant purchased slots inside an open transaction (payment
    /// settlement). Creates the ledger row on first purchase.
    pub async fn grant_slots(
        tx: &mut Transaction<'_, Postgres>,
        user_id: DbId,
        count: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "INSERT INTO user_credits (user_id, slots_remaining, total_purchased)
             VALUES ($1, $2, $2)
             ON CONFLICT (user_id) DO UPDATE
                 SET slots_remaining = user_credits.slots_remaining + EXCLUDED.slots_remaining,
                     total_purchased = user_credits.total_purchased + EXCLUDED.total_purchased,
                     updated_at = now()",
        )
        .bind(user_id)
        .bind(count)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}
