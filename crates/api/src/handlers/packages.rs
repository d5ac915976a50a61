//! Package catalogue handlers: a public listing plus admin CRUD.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;

use checkmate_core::error::CoreError;
use checkmate_core::types::DbId;
use checkmate_db::models::package::{CreatePackage, Package, UpdatePackage};
use checkmate_db::repositories::PackageRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// GET /packages
///
/// Public: shown on the pricing page before sign-in.
pub async fn list_packages(State(state): State<AppState>) -> AppResult<Json<Vec<Package>>> {
    let packages = PackageRepo::list(&state.pool).await?;
    Ok(Json(packages))
}

/// POST /admin/packages
pub async fn create_package(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(input): Json<CreatePackage>,
) -> AppResult<(StatusCode, Json<Package>)> {
    validate_package(&input.name, input.price.is_sign_negative(), input.slots)?;
    let package = PackageRepo::create(&state.pool, &input).await?;
    tracing::info!(package_id = package.id, name = %package.name, "Package created");
    Ok((StatusCode::CREATED, Json(package)))
}

/// PUT /admin/packages/{id}
pub async fn update_package(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    Json(input): Json<UpdatePackage>,
) -> AppResult<Json<Package>> {
    if let Some(slots) = input.slots {
        if slots <= 0 {
            return Err(AppError::Core(CoreError::Validation(
                "Slot count must be positive".into(),
            )));
        }
    }
    if input.price.is_some_and(|p| p.is_sign_negative()) {
        return Err(AppError::Core(CoreError::Validation(
            "Price cannot be negative".into(),
        )));
    }

    let package = PackageRepo::update(&state.pool, id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "package",
            id,
        }))?;
    Ok(Json(package))
}

/// DELETE /admin/packages/{id}
pub async fn delete_package(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let deleted = PackageRepo::delete(&state.pool, id).await?;
    if !deleted {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "package",
            id,
        }));
    }
    Ok(StatusCode::NO_CONTENT)
}

fn validate_package(name: &str, price_negative: bool, slots: i32) -> AppResult<()> {
    if name.trim().is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Package name is required".into(),
        )));
    }
    if price_negative {
        return Err(AppError::Core(CoreError::Validation(
            "Price cannot be negative".into(),
        )));
    }
    if slots <= 0 {
        return Err(AppError::Core(CoreError::Validation(
            "Slot count must be positive".into(),
        )));
    }
    Ok(())
}
