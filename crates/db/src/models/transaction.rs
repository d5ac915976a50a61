//! Payment transaction model and DTOs.

use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::FromRow;

use checkmate_core::types::{DbId, Timestamp};

use super::status::TransactionStatus;

/// Row from the `transactions` table.
///
/// `payment_reference` is the provider checkout id; it is the handle both
/// the client poll loop and the admin verify action use.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Transaction {
    pub id: DbId,
    pub user_id: DbId,
    pub amount: Decimal,
    pub slots_purchased: i32,
    pub phone_number: String,
    pub payment_reference: String,
    pub provider_reference: Option<String>,
    pub status: TransactionStatus,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a freshly initiated transaction.
#[derive(Debug)]
pub struct CreateTransaction {
    pub user_id: DbId,
    pub amount: Decimal,
    pub slots_purchased: i32,
    pub phone_number: String,
    pub payment_reference: String,
    pub provider_reference: Option<String>,
}

/// Admin listing row: transaction joined with its owner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct TransactionWithOwner {
    pub id: DbId,
    pub user_id: DbId,
    pub amount: Decimal,
    pub slots_purchased: i32,
    pub phone_number: String,
    pub payment_reference: String,
    pub status: TransactionStatus,
    pub failure_reason: Option<String>,
    pub created_at: Timestamp,
    pub owner_email: String,
}
