//! Admin routes. Every handler here extracts [`RequireAdmin`] itself, so
//! a non-admin token gets a 403 regardless of which route it hits.
//!
//! [`RequireAdmin`]: crate::middleware::rbac::RequireAdmin

use axum::routing::{get, post, put};
use axum::Router;

use crate::handlers::{daily_limit, notifications, orders, packages, payments, users};
use crate::state::AppState;

/// Routes mounted at `/admin`.
///
/// ```text
/// PUT  /daily-limit                    -> update_daily_limit
/// GET  /orders                         -> list_all_orders
/// POST /orders/{id}/start              -> start_order
/// POST /complete/{id}                  -> complete_order
/// GET  /users                          -> list_users
/// GET  /transactions                   -> list_transactions
/// POST /transactions/{ref}/verify      -> verify_transaction
/// POST /packages                       -> create_package
/// PUT  /packages/{id}                  -> update_package
/// DELETE /packages/{id}                -> delete_package
/// GET  /vapid-public-key               -> vapid_public_key
/// POST /subscribe-notifications        -> subscribe
/// POST /unsubscribe-notifications      -> unsubscribe
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/daily-limit", put(daily_limit::update_daily_limit))
        .route("/orders", get(orders::list_all_orders))
        .route("/orders/{id}/start", post(orders::start_order))
        .route("/complete/{id}", post(orders::complete_order))
        .route("/users", get(users::list_users))
        .route("/transactions", get(payments::list_transactions))
        .route(
            "/transactions/{reference}/verify",
            post(payments::verify_transaction),
        )
        .route("/packages", post(packages::create_package))
        .route(
            "/packages/{id}",
            put(packages::update_package).delete(packages::delete_package),
        )
        .route("/vapid-public-key", get(notifications::vapid_public_key))
        .route(
            "/subscribe-notifications",
            post(notifications::subscribe),
        )
        .route(
            "/unsubscribe-notifications",
            post(notifications::unsubscribe),
        )
}
