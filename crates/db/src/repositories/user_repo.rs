//! Repository for the `users` table.

use sqlx::PgPool;

use crate::models::user::{CreateUser, User, UserWithCredits};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, first_name, last_name, email, password_hash, is_admin, created_at, updated_at";

/// Provides CRUD operations for users.
pub struct UserRepo;

impl UserRepo {
    /// Insert a new user, returning the created row.
    pub async fn create(pool: &PgPool, input: &CreateUser) -> Result<User, sqlx::Error> {
        let query = format!(
            "INSERT INTO users (first_name, last_name, email, password_hash, is_admin)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, User>(&query)
            .bind(&input.first_name)
            .bind(&input.last_name)
            .bind(&input.email)
            .bind(&input.password_hash)
            .bind(input.is_admin)
            .fetch_one(pool)
            .await
    }

    /// Find a user by email (case-sensitive).
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM users WHERE email = $1");
        sqlx::query_as::<_, User>(&query)
            .bind(email)
            .fetch_optional(pool)
            .await
    }

    /// Replace a user's password hash (password reset).
    ///
    /// Returns `true` if a row was updated.
    pub async fn set_password_hash(
        pool: &PgPool,
        email: &str,
        password_hash: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $2, updated_at = now() WHERE email = $1",
        )
        .bind(email)
        .bind(password_hash)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Promote a user to admin. Returns `true` if a row changed.
    pub async fn promote_to_admin(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE users SET is_admin = true, updated_at = now()
             WHERE email = $1 AND is_admin = false",
        )
        .bind(email)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Admin listing: every user joined with their slot balance
    /// (zeroes when no ledger row exists), newest first.
    pub async fn list_with_credits(pool: &PgPool) -> Result<Vec<UserWithCredits>, sqlx::Error> {
        sqlx::query_as::<_, UserWithCredits>(
            "SELECT u.id, u.first_name, u.last_name, u.email, u.is_admin,
                    COALESCE(c.slots_remaining, 0) AS slots_remaining,
                    COALESCE(c.total_purchased, 0) AS total_purchased,
                    u.created_at
             FROM users u
             LEFT JOIN user_credits c ON c.user_id = u.id
             ORDER BY u.created_at DESC",
        )
        .fetch_all(pool)
        .await
    }
}
