//! Daily upload quota model.

use chrono::NaiveDate;
use serde::Serialize;
use sqlx::FromRow;

use checkmate_core::quota;
use checkmate_core::types::{DbId, Timestamp};

/// Row from the `daily_limits` table: the global quota for one UTC day.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct DailyLimit {
    pub id: DbId,
    pub day: NaiveDate,
    pub max_uploads: i32,
    pub current_uploads: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl DailyLimit {
    /// Uploads still admissible today, clamped at zero.
    pub fn remaining(&self) -> i32 {
        quota::remaining(self.max_uploads, self.current_uploads)
    }
}

/// Response body for the daily-limit endpoints.
#[derive(Debug, Serialize)]
pub struct DailyLimitStatus {
    pub day: NaiveDate,
    pub max_uploads: i32,
    pub current_uploads: i32,
    pub remaining: i32,
}

impl From<DailyLimit> for DailyLimitStatus {
    fn from(l: DailyLimit) -> Self {
        Self {
            day: l.day,
            max_uploads: l.max_uploads,
            current_uploads: l.current_uploads,
            remaining: l.remaining(),
        }
    }
}
