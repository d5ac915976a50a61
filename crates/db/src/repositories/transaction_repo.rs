//! Repository for the `transactions` table, including idempotent payment
//! settlement.

use sqlx::PgPool;

use crate::models::status::TransactionStatus;
use crate::models::transaction::{CreateTransaction, Transaction, TransactionWithOwner};

const COLUMNS: &str = "id, user_id, amount, slots_purchased, phone_number, payment_reference, \
                       provider_reference, status, failure_reason, created_at, updated_at";

/// Result of a settlement attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettlementOutcome {
    /// This call moved the transaction to `completed` and granted slots.
    Completed,
    /// This call moved the transaction to `failed`.
    Failed,
    /// The transaction was already terminal; nothing changed and no slots
    /// were granted (the idempotence guarantee under repeated polling).
    AlreadySettled(TransactionStatus),
}

/// Provides transaction CRUD and the settlement state machine.
pub struct TransactionRepo;

impl TransactionRepo {
    /// Record a freshly initiated, still-pending transaction.
    pub async fn create(
        pool: &PgPool,
        input: &CreateTransaction,
    ) -> Result<Transaction, sqlx::Error> {
        let query = format!(
            "INSERT INTO transactions
                 (user_id, amount, slots_purchased, phone_number, payment_reference, provider_reference)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Transaction>(&query)
            .bind(input.user_id)
            .bind(input.amount)
            .bind(input.slots_purchased)
            .bind(&input.phone_number)
            .bind(&input.payment_reference)
            .bind(&input.provider_reference)
            .fetch_one(pool)
            .await
    }

    /// Find a transaction by its provider checkout reference.
    pub async fn find_by_reference(
        pool: &PgPool,
        payment_reference: &str,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM transactions WHERE payment_reference = $1");
        sqlx::query_as::<_, Transaction>(&query)
            .bind(payment_reference)
            .fetch_optional(pool)
            .await
    }

    /// Settle a transaction as completed: CAS `pending -> completed`, then
    /// grant the purchased slots and consume package inventory — all in one
    /// transaction.
    ///
    /// The CAS means a second settlement of the same reference observes
    /// zero rows affected and returns [`SettlementOutcome::AlreadySettled`]
    /// without touching the ledger: slots are granted exactly once no
    /// matter how many pollers race.
    pub async fn settle_completed(
        pool: &PgPool,
        payment_reference: &str,
    ) -> Result<SettlementOutcome, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE transactions SET status = 'completed', updated_at = now()
             WHERE payment_reference = $1 AND status = 'pending'
             RETURNING {COLUMNS}"
        );
        let Some(settled) = sqlx::query_as::<_, Transaction>(&query)
            .bind(payment_reference)
            .fetch_optional(&mut *tx)
            .await?
        else {
            tx.rollback().await?;
            let current = Self::find_by_reference(pool, payment_reference)
                .await?
                .map_or(TransactionStatus::Failed, |t| t.status);
            return Ok(SettlementOutcome::AlreadySettled(current));
        };

        super::CreditRepo::grant_slots(&mut tx, settled.user_id, settled.slots_purchased).await?;

        // Consume inventory from the matching package; a sold-out package
        // simply stops matching future initiations.
        sqlx::query(
            "UPDATE packages
             SET available_slots = available_slots - 1, updated_at = now()
             WHERE slots = $1 AND available_slots > 0",
        )
        .bind(settled.slots_purchased)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(SettlementOutcome::Completed)
    }

    /// Settle a transaction as failed: CAS `pending -> failed` with a
    /// reason. Terminal transactions are left untouched.
    pub async fn settle_failed(
        pool: &PgPool,
        payment_reference: &str,
        reason: &str,
    ) -> Result<SettlementOutcome, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE transactions
             SET status = 'failed', failure_reason = $2, updated_at = now()
             WHERE payment_reference = $1 AND status = 'pending'",
        )
        .bind(payment_reference)
        .bind(reason)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            Ok(SettlementOutcome::Failed)
        } else {
            let current = Self::find_by_reference(pool, payment_reference)
                .await?
                .map_or(TransactionStatus::Failed, |t| t.status);
            Ok(SettlementOutcome::AlreadySettled(current))
        }
    }

    /// Admin listing: all transactions joined with owner email, newest
    /// first.
    pub async fn list_with_owner(pool: &PgPool) -> Result<Vec<TransactionWithOwner>, sqlx::Error> {
        sqlx::query_as::<_, TransactionWithOwner>(
            "SELECT t.id, t.user_id, t.amount, t.slots_purchased, t.phone_number,
                    t.payment_reference, t.status, t.failure_reason, t.created_at,
                    u.email AS owner_email
             FROM transactions t
             JOIN users u ON u.id = t.user_id
             ORDER BY t.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}
