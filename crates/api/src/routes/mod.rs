//! Route tree assembly.

pub mod admin;
pub mod auth;
pub mod payment;
pub mod user;

use axum::routing::{get, post};
use axum::Router;

use crate::handlers;
use crate::state::AppState;

/// Build the full route tree, mounted at the server root.
///
/// ```text
/// GET  /health                  liveness (public)
/// GET  /packages                package catalogue (public)
///
/// /auth/...                     signup, login, OTP, Google, password reset
///
/// POST /upload                  document upload (auth)
/// GET  /daily-limit             quota snapshot (auth)
/// GET  /download/{filename}     stored file download (auth, ownership checked)
///
/// /user/...                     own orders and credits (auth)
/// /payment/...                  STK push initiate and status poll (auth)
/// /admin/...                    order lifecycle, users, transactions,
///                               packages, quota, push subscriptions (admin)
/// ```
pub fn app_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/packages", get(handlers::packages::list_packages))
        .route("/upload", post(handlers::orders::upload))
        .route("/daily-limit", get(handlers::daily_limit::get_daily_limit))
        .route(
            "/download/{filename}",
            get(handlers::downloads::download_file),
        )
        .nest("/auth", auth::router())
        .nest("/user", user::router())
        .nest("/payment", payment::router())
        .nest("/admin", admin::router())
}
