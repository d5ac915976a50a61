//! Authentication routes.

use axum::routing::post;
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`. All public.
///
/// ```text
/// POST /signup           -> signup
/// POST /login            -> login
/// POST /otp              -> send_otp
/// POST /google           -> google_login
/// POST /forgot-password  -> forgot_password
/// POST /reset-password   -> reset_password
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/otp", post(auth::send_otp))
        .route("/google", post(auth::google_login))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/reset-password", post(auth::reset_password))
}
