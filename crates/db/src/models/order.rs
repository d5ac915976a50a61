//! Order entity model and DTOs.

use serde::Serialize;
use sqlx::FromRow;

use checkmate_core::types::{DbId, Timestamp};

use super::status::OrderStatus;

/// Full order row from the `orders` table.
///
/// `stored_file_path` is the namespaced on-disk path and never leaves the
/// server; clients only ever see `original_filename`.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Order {
    pub id: DbId,
    pub user_id: DbId,
    pub payment_ref: String,
    pub status: OrderStatus,
    pub original_filename: String,
    #[serde(skip_serializing)]
    pub stored_file_path: String,
    pub ai_score: Option<i32>,
    pub sim_score: Option<i32>,
    pub report1_path: Option<String>,
    pub report2_path: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating an order on upload.
#[derive(Debug)]
pub struct CreateOrder {
    pub user_id: DbId,
    pub payment_ref: String,
    pub original_filename: String,
    pub stored_file_path: String,
}

/// Admin listing row: order joined with its owner.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct OrderWithOwner {
    pub id: DbId,
    pub user_id: DbId,
    pub status: OrderStatus,
    pub original_filename: String,
    pub ai_score: Option<i32>,
    pub sim_score: Option<i32>,
    pub report1_path: Option<String>,
    pub report2_path: Option<String>,
    pub created_at: Timestamp,
    pub owner_email: String,
    pub owner_first_name: String,
    pub owner_last_name: String,
}
