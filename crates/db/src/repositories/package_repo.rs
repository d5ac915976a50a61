//! Repository for the `packages` catalog.

use sqlx::PgPool;

use checkmate_core::types::DbId;

use crate::models::package::{CreatePackage, Package, UpdatePackage};

const COLUMNS: &str = "id, name, price, currency, slots, features, unavailable, highlight, \
                       offer, available_slots, created_at, updated_at";

pub struct PackageRepo;

impl PackageRepo {
    /// Public catalog, cheapest first.
    pub async fn list(pool: &PgPool) -> Result<Vec<Package>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM packages ORDER BY price ASC");
        sqlx::query_as::<_, Package>(&query).fetch_all(pool).await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Package>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM packages WHERE id = $1");
        sqlx::query_as::<_, Package>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a purchasable package by its slot count. Unavailable or
    /// sold-out packages do not match, so initiation fails before any
    /// money moves.
    pub async fn find_available_by_slots(
        pool: &PgPool,
        slots: i32,
    ) -> Result<Option<Package>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM packages
             WHERE slots = $1 AND NOT unavailable AND available_slots > 0"
        );
        sqlx::query_as::<_, Package>(&query)
            .bind(slots)
            .fetch_optional(pool)
            .await
    }

    pub async fn create(pool: &PgPool, input: &CreatePackage) -> Result<Package, sqlx::Error> {
        let query = format!(
            "INSERT INTO packages
                 (name, price, currency, slots, features, unavailable, highlight, offer, available_slots)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Package>(&query)
            .bind(&input.name)
            .bind(input.price)
            .bind(&input.currency)
            .bind(input.slots)
            .bind(&input.features)
            .bind(input.unavailable)
            .bind(input.highlight)
            .bind(&input.offer)
            .bind(input.available_slots)
            .fetch_one(pool)
            .await
    }

    /// Partial update; absent fields keep their current value.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdatePackage,
    ) -> Result<Option<Package>, sqlx::Error> {
        let query = format!(
            "UPDATE packages SET
                 name = COALESCE($2, name),
                 price = COALESCE($3, price),
                 currency = COALESCE($4, currency),
                 slots = COALESCE($5, slots),
                 features = COALESCE($6, features),
                 unavailable = COALESCE($7, unavailable),
                 highlight = COALESCE($8, highlight),
                 offer = COALESCE($9, offer),
                 available_slots = COALESCE($10, available_slots),
                 updated_at = now()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Package>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(input.price)
            .bind(&input.currency)
            .bind(input.slots)
            .bind(&input.features)
            .bind(input.unavailable)
            .bind(input.highlight)
            .bind(&input.offer)
            .bind(input.available_slots)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM packages WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
