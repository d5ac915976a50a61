//! Payment routes.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::payments;
use crate::state::AppState;

/// Routes mounted at `/payment`. Both require authentication.
///
/// ```text
/// POST /initiate               -> initiate_payment
/// GET  /status/{checkout_id}   -> payment_status
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/initiate", post(payments::initiate_payment))
        .route("/status/{checkout_id}", get(payments::payment_status))
}
