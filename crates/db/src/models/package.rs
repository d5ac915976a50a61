//! Purchasable slot package model and DTOs.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use checkmate_core::types::{DbId, Timestamp};

/// Row from the `packages` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Package {
    pub id: DbId,
    pub name: String,
    pub price: Decimal,
    pub currency: String,
    pub slots: i32,
    pub features: serde_json::Value,
    pub unavailable: bool,
    pub highlight: bool,
    pub offer: Option<String>,
    pub available_slots: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for creating a package (admin CRUD).
#[derive(Debug, Deserialize)]
pub struct CreatePackage {
    pub name: String,
    pub price: Decimal,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub slots: i32,
    #[serde(default)]
    pub features: serde_json::Value,
    #[serde(default)]
    pub unavailable: bool,
    #[serde(default)]
    pub highlight: bool,
    pub offer: Option<String>,
    #[serde(default)]
    pub available_slots: i32,
}

/// DTO for updating a package. Only non-`None` fields are applied.
#[derive(Debug, Deserialize)]
pub struct UpdatePackage {
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub slots: Option<i32>,
    pub features: Option<serde_json::Value>,
    pub unavailable: Option<bool>,
    pub highlight: Option<bool>,
    pub offer: Option<String>,
    pub available_slots: Option<i32>,
}

fn default_currency() -> String {
    "KSH".to_string()
}
