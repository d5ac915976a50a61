//! Web Push subscription model.

use serde::Deserialize;
use sqlx::FromRow;

use checkmate_core::types::{DbId, Timestamp};

/// Row from the `push_subscriptions` table: one browser/device endpoint.
#[derive(Debug, Clone, FromRow)]
pub struct PushSubscription {
    pub id: DbId,
    pub user_id: DbId,
    pub endpoint: String,
    pub p256dh: String,
    pub auth_secret: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// The subscription JSON produced by `PushManager.subscribe()` in the
/// browser, as relayed by the admin frontend.
#[derive(Debug, Deserialize)]
pub struct SubscriptionPayload {
    pub endpoint: String,
    pub keys: SubscriptionKeys,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionKeys {
    pub p256dh: String,
    pub auth: String,
}
