//! Signup OTP codes and password-reset tokens.

use sqlx::FromRow;

use checkmate_core::types::{DbId, Timestamp};

/// Row from the `verification_codes` table (signup OTP).
#[derive(Debug, Clone, FromRow)]
pub struct VerificationCode {
    pub id: DbId,
    pub email: String,
    pub code: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}

/// Row from the `password_reset_tokens` table.
#[derive(Debug, Clone, FromRow)]
pub struct PasswordResetToken {
    pub id: DbId,
    pub email: String,
    pub token: String,
    pub expires_at: Timestamp,
    pub created_at: Timestamp,
}
