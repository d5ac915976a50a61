use std::sync::Arc;

use checkmate_events::{EmailDelivery, EventBus};
use checkmate_mpesa::PaymentGateway;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: checkmate_db::DbPool,
    /// Server configuration (accessed by middleware and handlers).
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing platform events.
    pub event_bus: Arc<EventBus>,
    /// Mobile-money provider; a stub in tests, Daraja in production.
    pub gateway: Arc<dyn PaymentGateway>,
    /// SMTP mailer; `None` when email delivery is not configured.
    pub mailer: Option<Arc<EmailDelivery>>,
    /// VAPID public key advertised to admin browsers; `None` when push
    /// delivery is not configured.
    pub vapid_public_key: Option<String>,
}
