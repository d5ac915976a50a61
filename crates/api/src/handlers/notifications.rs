//! Admin Web Push subscription handlers.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use checkmate_db::models::push_subscription::SubscriptionPayload;
use checkmate_db::repositories::PushSubscriptionRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::MessageResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct VapidKeyResponse {
    pub public_key: String,
}

#[derive(Debug, Deserialize)]
pub struct UnsubscribeRequest {
    pub endpoint: String,
}

/// GET /admin/vapid-public-key
///
/// The browser needs the application server key before it can subscribe.
pub async fn vapid_public_key(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<VapidKeyResponse>> {
    let public_key = state
        .vapid_public_key
        .clone()
        .ok_or_else(|| AppError::NotFound("Push notifications are not configured".into()))?;
    Ok(Json(VapidKeyResponse { public_key }))
}

/// POST /admin/subscribe-notifications
pub async fn subscribe(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(payload): Json<SubscriptionPayload>,
) -> AppResult<Json<MessageResponse>> {
    PushSubscriptionRepo::upsert(&state.pool, admin.user_id, &payload).await?;
    tracing::info!(user_id = admin.user_id, "Push subscription registered");
    Ok(Json(MessageResponse::new("Subscribed to notifications")))
}

/// POST /admin/unsubscribe-notifications
pub async fn unsubscribe(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(input): Json<UnsubscribeRequest>,
) -> AppResult<Json<MessageResponse>> {
    PushSubscriptionRepo::delete_by_endpoint(&state.pool, admin.user_id, &input.endpoint).await?;
    Ok(Json(MessageResponse::new("Unsubscribed from notifications")))
}
