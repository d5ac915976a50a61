//! Routes for the authenticated user's own resources.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{orders, users};
use crate::state::AppState;

/// Routes mounted at `/user`. All require authentication.
///
/// ```text
/// GET    /orders       -> list_my_orders
/// DELETE /orders/{id}  -> delete_order (owner only)
/// GET    /credits      -> my_credits
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(orders::list_my_orders))
        .route("/orders/{id}", delete(orders::delete_order))
        .route("/credits", get(users::my_credits))
}
