//! Handlers for the `/auth` resource (signup, login, OTP, Google sign-in,
//! password reset).

use axum::extract::State;
use axum::Json;
use chrono::{Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use checkmate_core::error::CoreError;
use checkmate_db::models::user::{CreateUser, UserResponse};
use checkmate_db::repositories::{AuthTokenRepo, UserRepo};

use crate::auth::jwt::generate_access_token;
use crate::auth::password::{hash_password, validate_password_strength, verify_password};
use crate::error::{AppError, AppResult};
use crate::response::MessageResponse;
use crate::state::AppState;

/// Signup OTP lifetime.
const OTP_EXPIRY_MINS: i64 = 10;

/// Password-reset token lifetime.
const RESET_TOKEN_EXPIRY_MINS: i64 = 60;

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Request body for `POST /auth/signup`.
#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    /// Verification code from the OTP email; checked when email delivery
    /// is configured.
    pub code: Option<String>,
}

/// Request body for `POST /auth/login`.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for `POST /auth/otp`.
#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub email: String,
}

/// Request body for `POST /auth/google`.
#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    pub id_token: String,
}

/// Request body for `POST /auth/forgot-password`.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for `POST /auth/reset-password`.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// Successful authentication response returned by signup, login, and
/// Google sign-in.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Subset of Google's tokeninfo response we care about.
#[derive(Debug, Deserialize)]
struct GoogleTokenInfo {
    aud: String,
    email: String,
    #[serde(default)]
    given_name: String,
    #[serde(default)]
    family_name: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /auth/signup
///
/// Register a new account. The email named in `ADMIN_EMAIL` is created
/// with the admin flag set.
pub async fn signup(
    State(state): State<AppState>,
    Json(input): Json<SignupRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "A valid email address is required".into(),
        )));
    }
    if input.first_name.trim().is_empty() || input.last_name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "First and last name are required".into(),
        )));
    }
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    // Email verification is enforced only when the server can actually
    // send codes.
    if state.mailer.is_some() {
        let code = input.code.as_deref().unwrap_or("");
        AuthTokenRepo::find_valid_code(&state.pool, &email, code)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Validation(
                    "Invalid or expired verification code".into(),
                ))
            })?;
        AuthTokenRepo::consume_codes(&state.pool, &email).await?;
    }

    if UserRepo::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Core(CoreError::Conflict(
            "An account with this email already exists".into(),
        )));
    }

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    let is_admin = state.config.admin_email.as_deref() == Some(email.as_str());

    let user = UserRepo::create(
        &state.pool,
        &CreateUser {
            first_name: input.first_name.trim().to_string(),
            last_name: input.last_name.trim().to_string(),
            email,
            password_hash,
            is_admin,
        },
    )
    .await?;

    let token = generate_access_token(user.id, &user.email, user.is_admin, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /auth/login
///
/// Authenticate with email + password. Returns a bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(input): Json<LoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let email = input.email.trim().to_lowercase();

    let user = UserRepo::find_by_email(&state.pool, &email)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized("Invalid email or password".into()))
        })?;

    let password_valid = verify_password(&input.password, &user.password_hash)
        .map_err(|e| AppError::InternalError(format!("Password verification error: {e}")))?;
    if !password_valid {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid email or password".into(),
        )));
    }

    let token = generate_access_token(user.id, &user.email, user.is_admin, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /auth/otp
///
/// Email a 6-digit verification code for signup.
pub async fn send_otp(
    State(state): State<AppState>,
    Json(input): Json<OtpRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = input.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "A valid email address is required".into(),
        )));
    }

    let mailer = state.mailer.as_ref().ok_or_else(|| {
        AppError::InternalError("Email delivery is not configured".to_string())
    })?;

    let code = format!("{:06}", rand::rng().random_range(0..1_000_000));
    let expires_at = Utc::now() + Duration::minutes(OTP_EXPIRY_MINS);
    AuthTokenRepo::store_verification_code(&state.pool, &email, &code, expires_at).await?;

    mailer
        .send_verification_code(&email, &code)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to send OTP email: {e}")))?;

    Ok(Json(MessageResponse {
        message: "Verification code sent".to_string(),
    }))
}

/// POST /auth/google
///
/// Verify a Google ID token against the tokeninfo endpoint and issue the
/// same JWT as password login, creating the account on first sign-in.
pub async fn google_login(
    State(state): State<AppState>,
    Json(input): Json<GoogleLoginRequest>,
) -> AppResult<Json<AuthResponse>> {
    let client_id = state.config.google_client_id.as_deref().ok_or_else(|| {
        AppError::InternalError("Google sign-in is not configured".to_string())
    })?;

    let response = reqwest::Client::new()
        .get("https://oauth2.googleapis.com/tokeninfo")
        .query(&[("id_token", input.id_token.as_str())])
        .send()
        .await
        .map_err(|e| AppError::InternalError(format!("Google tokeninfo request failed: {e}")))?;

    if !response.status().is_success() {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Invalid Google token".into(),
        )));
    }

    let info: GoogleTokenInfo = response
        .json()
        .await
        .map_err(|e| AppError::InternalError(format!("Google tokeninfo parse error: {e}")))?;

    if info.aud != client_id {
        return Err(AppError::Core(CoreError::Unauthorized(
            "Google token issued for a different application".into(),
        )));
    }

    let email = info.email.trim().to_lowercase();
    let user = match UserRepo::find_by_email(&state.pool, &email).await? {
        Some(user) => user,
        None => {
            // First Google sign-in: create an account with an unusable
            // random password.
            let password_hash = hash_password(&Uuid::new_v4().to_string())
                .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;
            let is_admin = state.config.admin_email.as_deref() == Some(email.as_str());
            UserRepo::create(
                &state.pool,
                &CreateUser {
                    first_name: info.given_name,
                    last_name: info.family_name,
                    email,
                    password_hash,
                    is_admin,
                },
            )
            .await?
        }
    };

    let token = generate_access_token(user.id, &user.email, user.is_admin, &state.config.jwt)
        .map_err(|e| AppError::InternalError(format!("Token generation error: {e}")))?;

    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// POST /auth/forgot-password
///
/// Email a single-use reset link. Always answers with the same message so
/// the endpoint cannot be used to probe for accounts.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(input): Json<ForgotPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    let email = input.email.trim().to_lowercase();
    let message = MessageResponse {
        message: "If an account with this email exists, a reset link has been sent".to_string(),
    };

    let Some(mailer) = state.mailer.as_ref() else {
        return Err(AppError::InternalError(
            "Email delivery is not configured".to_string(),
        ));
    };

    if UserRepo::find_by_email(&state.pool, &email).await?.is_none() {
        return Ok(Json(message));
    }

    let token = Uuid::new_v4().to_string();
    let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_EXPIRY_MINS);
    AuthTokenRepo::store_reset_token(&state.pool, &email, &token, expires_at).await?;

    let reset_link = format!("{}/reset-password?token={token}", state.config.frontend_url);
    mailer
        .send_password_reset(&email, &reset_link)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to send reset email: {e}")))?;

    Ok(Json(message))
}

/// POST /auth/reset-password
///
/// Consume a reset token and store a new password hash.
pub async fn reset_password(
    State(state): State<AppState>,
    Json(input): Json<ResetPasswordRequest>,
) -> AppResult<Json<MessageResponse>> {
    validate_password_strength(&input.password)
        .map_err(|msg| AppError::Core(CoreError::Validation(msg)))?;

    let reset = AuthTokenRepo::find_valid_reset_token(&state.pool, &input.token)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::Validation("Invalid or expired reset token".into()))
        })?;

    let password_hash = hash_password(&input.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing error: {e}")))?;

    UserRepo::set_password_hash(&state.pool, &reset.email, &password_hash).await?;
    AuthTokenRepo::consume_reset_token(&state.pool, &input.token).await?;

    Ok(Json(MessageResponse {
        message: "Password updated".to_string(),
    }))
}
