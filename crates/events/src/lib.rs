//! Event bus and notification infrastructure.
//!
//! Building blocks for the platform-wide event system:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`PlatformEvent`] — the canonical domain event envelope.
//! - [`NotificationDispatcher`] — background service that relays order
//!   and payment events to admin browsers over Web Push.
//! - [`delivery`] — external delivery channels (Web Push, email).

pub mod bus;
pub mod delivery;
pub mod dispatcher;

pub use bus::{EventBus, PlatformEvent};
pub use delivery::email::{EmailConfig, EmailDelivery};
pub use delivery::push::{PushDelivery, VapidConfig};
pub use dispatcher::NotificationDispatcher;
