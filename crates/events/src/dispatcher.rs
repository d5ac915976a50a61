//! Admin notification dispatcher.
//!
//! [`NotificationDispatcher`] subscribes to the [`EventBus`](crate::bus::EventBus)
//! broadcast channel and, for every order or payment event, fans a
//! wake-up push out to every registered admin subscription. Endpoints
//! the push service reports as gone are pruned on the spot.

use tokio::sync::broadcast;

use checkmate_db::repositories::PushSubscriptionRepo;
use checkmate_db::DbPool;

use crate::bus::PlatformEvent;
use crate::delivery::push::{PushDelivery, PushError};

/// Event types that wake the admin dashboard.
const NOTIFY_EVENTS: [&str; 2] = ["order.created", "payment.completed"];

/// Background service that relays platform events to admin browsers.
pub struct NotificationDispatcher;

impl NotificationDispatcher {
    /// Run the dispatch loop.
    ///
    /// Subscribes via the provided `receiver` and pushes until the
    /// channel closes (i.e. the bus is dropped at shutdown).
    pub async fn run(
        pool: DbPool,
        delivery: PushDelivery,
        mut receiver: broadcast::Receiver<PlatformEvent>,
    ) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    if NOTIFY_EVENTS.contains(&event.event_type.as_str()) {
                        Self::fan_out(&pool, &delivery, &event).await;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Notification dispatcher lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::info!("Event bus closed, notification dispatcher shutting down");
                    break;
                }
            }
        }
    }

    /// Push one event to every admin subscription.
    ///
    /// Delivery failures are logged, never propagated: a broken endpoint
    /// must not block the others.
    async fn fan_out(pool: &DbPool, delivery: &PushDelivery, event: &PlatformEvent) {
        let subscriptions = match PushSubscriptionRepo::list_for_admins(pool).await {
            Ok(subs) => subs,
            Err(e) => {
                tracing::error!(error = %e, "Failed to load admin push subscriptions");
                return;
            }
        };

        for sub in subscriptions {
            match delivery.deliver(&sub.endpoint, &event.event_type).await {
                Ok(()) => {
                    tracing::debug!(
                        subscription_id = sub.id,
                        event_type = %event.event_type,
                        "Push delivered"
                    );
                }
                Err(PushError::Gone(status)) => {
                    tracing::info!(
                        subscription_id = sub.id,
                        status,
                        "Subscription gone, pruning"
                    );
                    if let Err(e) = PushSubscriptionRepo::delete(pool, sub.id).await {
                        tracing::error!(error = %e, "Failed to prune dead subscription");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        subscription_id = sub.id,
                        error = %e,
                        "Push delivery failed"
                    );
                }
            }
        }
    }
}
