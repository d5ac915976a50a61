//! User account handlers: own credit balance and the admin user listing.

use axum::extract::State;
use axum::Json;

use checkmate_db::models::user::UserWithCredits;
use checkmate_db::models::user_credits::CreditBalance;
use checkmate_db::repositories::{CreditRepo, UserRepo};

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// GET /user/credits
///
/// Users without a ledger row read as a zero balance.
pub async fn my_credits(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<CreditBalance>> {
    let balance = CreditRepo::balance(&state.pool, user.user_id).await?;
    Ok(Json(balance))
}

/// GET /admin/users
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<UserWithCredits>>> {
    let users = UserRepo::list_with_credits(&state.pool).await?;
    Ok(Json(users))
}
