//! Per-user slot ledger model.

use serde::Serialize;
use sqlx::FromRow;

use checkmate_core::types::{DbId, Timestamp};

/// Row from the `user_credits` table. One per user, created lazily.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct UserCredits {
    pub id: DbId,
    pub user_id: DbId,
    pub slots_remaining: i32,
    pub total_purchased: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Balance summary for `GET /user/credits`. Users without a ledger row
/// simply have zero of everything.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CreditBalance {
    pub slots_remaining: i32,
    pub total_purchased: i32,
}
