//! Handlers for the global daily upload quota.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Deserialize;

use checkmate_core::error::CoreError;
use checkmate_core::quota;
use checkmate_db::models::daily_limit::DailyLimitStatus;
use checkmate_db::repositories::DailyLimitRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Admin adjustment. Exactly one of the two fields must be present:
/// `max_uploads` sets the cap directly, `remaining_today` reopens that
/// many units on top of today's consumption.
#[derive(Debug, Deserialize)]
pub struct UpdateDailyLimit {
    pub max_uploads: Option<i32>,
    pub remaining_today: Option<i32>,
}

/// GET /daily-limit
pub async fn get_daily_limit(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<Json<DailyLimitStatus>> {
    let limit = DailyLimitRepo::get_or_create(&state.pool, Utc::now().date_naive()).await?;
    Ok(Json(limit.into()))
}

/// PUT /admin/daily-limit
pub async fn update_daily_limit(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<UpdateDailyLimit>,
) -> AppResult<Json<DailyLimitStatus>> {
    let today = Utc::now().date_naive();

    let max_uploads = match (input.max_uploads, input.remaining_today) {
        (Some(max), None) => max,
        (None, Some(remaining)) => {
            let current = DailyLimitRepo::get_or_create(&state.pool, today)
                .await?
                .current_uploads;
            quota::max_from_remaining(current, remaining)
        }
        _ => {
            return Err(AppError::Core(CoreError::Validation(
                "Provide exactly one of 'max_uploads' or 'remaining_today'".into(),
            )));
        }
    };

    if max_uploads < 0 {
        return Err(AppError::Core(CoreError::Validation(
            "The daily limit cannot be negative".into(),
        )));
    }

    let limit = DailyLimitRepo::set_max_uploads(&state.pool, today, max_uploads).await?;
    tracing::info!(max_uploads = limit.max_uploads, "Daily upload limit updated");

    Ok(Json(limit.into()))
}
