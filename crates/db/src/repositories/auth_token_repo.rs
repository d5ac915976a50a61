//! Repository for signup OTP codes and password-reset tokens.

use sqlx::PgPool;

use checkmate_core::types::Timestamp;

use crate::models::auth_token::{PasswordResetToken, VerificationCode};

pub struct AuthTokenRepo;

impl AuthTokenRepo {
    /// Store a fresh OTP for an email, replacing any earlier outstanding
    /// code for the same address.
    pub async fn store_verification_code(
        pool: &PgPool,
        email: &str,
        code: &str,
        expires_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO verification_codes (email, code, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(email)
        .bind(code)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    /// Fetch a still-valid OTP for an email/code pair.
    pub async fn find_valid_code(
        pool: &PgPool,
        email: &str,
        code: &str,
    ) -> Result<Option<VerificationCode>, sqlx::Error> {
        sqlx::query_as::<_, VerificationCode>(
            "SELECT id, email, code, expires_at, created_at
             FROM verification_codes
             WHERE email = $1 AND code = $2 AND expires_at > now()",
        )
        .bind(email)
        .bind(code)
        .fetch_optional(pool)
        .await
    }

    /// Remove all codes for an email once one has been redeemed.
    pub async fn consume_codes(pool: &PgPool, email: &str) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM verification_codes WHERE email = $1")
            .bind(email)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Store a password-reset token, replacing any outstanding one for the
    /// same address.
    pub async fn store_reset_token(
        pool: &PgPool,
        email: &str,
        token: &str,
        expires_at: Timestamp,
    ) -> Result<(), sqlx::Error> {
        let mut tx = pool.begin().await?;
        sqlx::query("DELETE FROM password_reset_tokens WHERE email = $1")
            .bind(email)
            .execute(&mut *tx)
            .await?;
        sqlx::query(
            "INSERT INTO password_reset_tokens (email, token, expires_at) VALUES ($1, $2, $3)",
        )
        .bind(email)
        .bind(token)
        .bind(expires_at)
        .execute(&mut *tx)
        .await?;
        tx.commit().await
    }

    pub async fn find_valid_reset_token(
        pool: &PgPool,
        token: &str,
    ) -> Result<Option<PasswordResetToken>, sqlx::Error> {
        sqlx::query_as::<_, PasswordResetToken>(
            "SELECT id, email, token, expires_at, created_at
             FROM password_reset_tokens
             WHERE token = $1 AND expires_at > now()",
        )
        .bind(token)
        .fetch_optional(pool)
        .await
    }

    /// Single-use redemption: delete the token row, reporting whether it
    /// existed.
    pub async fn consume_reset_token(pool: &PgPool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM password_reset_tokens WHERE token = $1")
            .bind(token)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Drop expired rows from both tables.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let mut purged = 0;
        purged += sqlx::query("DELETE FROM verification_codes WHERE expires_at <= now()")
            .execute(pool)
            .await?
            .rows_affected();
        purged += sqlx::query("DELETE FROM password_reset_tokens WHERE expires_at <= now()")
            .execute(pool)
            .await?
            .rows_affected();
        Ok(purged)
    }
}
