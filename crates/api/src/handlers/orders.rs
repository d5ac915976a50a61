//! Handlers for document uploads and the order lifecycle.
//!
//! Upload admission is one database transaction that consumes both gates
//! (global daily quota, user slot balance) together with the order insert,
//! so a rejected upload never burns a slot or a quota unit.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use checkmate_core::error::CoreError;
use checkmate_core::scores::parse_score;
use checkmate_core::storage::{
    stored_report_name, stored_upload_name, validate_upload_size,
};
use checkmate_core::types::DbId;
use checkmate_db::models::order::{CreateOrder, Order, OrderWithOwner};
use checkmate_db::models::status::OrderStatus;
use checkmate_db::repositories::OrderRepo;
use checkmate_events::PlatformEvent;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireAdmin;
use crate::state::AppState;

/// Payment reference recorded on orders admitted against a slot balance.
const SLOT_UPLOAD_REF: &str = "SLOT_UPLOAD";

/// Response for a successful upload.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub order: Order,
}

// ---------------------------------------------------------------------------
// User-facing handlers
// ---------------------------------------------------------------------------

/// POST /upload
///
/// Accept a multipart `file` field, store it under the configured upload
/// directory, and admit the order through the quota and credit gates.
pub async fn upload(
    State(state): State<AppState>,
    user: AuthUser,
    mut multipart: Multipart,
) -> AppResult<Json<UploadResponse>> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let original = field
                .file_name()
                .map(sanitize_filename)
                .filter(|n| !n.is_empty())
                .ok_or_else(|| {
                    AppError::Core(CoreError::Validation("Uploaded file needs a name".into()))
                })?;
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
            file = Some((original, bytes.to_vec()));
        }
    }

    let (original, bytes) = file.ok_or_else(|| {
        AppError::Core(CoreError::Validation("A 'file' field is required".into()))
    })?;
    validate_upload_size(bytes.len())?;

    let stored_name = stored_upload_name(user.user_id, Utc::now().timestamp(), &original);
    let stored_path = format!("{}/{stored_name}", state.config.upload_dir);

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(&stored_path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store upload: {e}")))?;

    let input = CreateOrder {
        user_id: user.user_id,
        payment_ref: SLOT_UPLOAD_REF.to_string(),
        original_filename: original,
        stored_file_path: stored_path.clone(),
    };

    let order = match OrderRepo::admit_upload(&state.pool, Utc::now().date_naive(), &input).await {
        Ok(order) => order,
        Err(e) => {
            // The gates rejected the order; the stored file must not
            // linger.
            let _ = tokio::fs::remove_file(&stored_path).await;
            return Err(e.into());
        }
    };

    state
        .event_bus
        .publish(PlatformEvent::order_created(order.id, user.user_id));
    tracing::info!(order_id = order.id, user_id = user.user_id, "Upload admitted");

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        order,
    }))
}

/// GET /user/orders
pub async fn list_my_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<Vec<Order>>> {
    let orders = OrderRepo::list_by_user(&state.pool, user.user_id).await?;
    Ok(Json(orders))
}

/// DELETE /user/orders/{id}
///
/// Owner-only. Removes the database row and every stored file the order
/// references.
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "order",
            id,
        }))?;

    if order.user_id != user.user_id {
        return Err(AppError::Core(CoreError::Forbidden(
            "You do not own this order".into(),
        )));
    }

    OrderRepo::delete(&state.pool, id).await?;
    remove_order_files(&order).await;

    Ok(StatusCode::NO_CONTENT)
}

// ---------------------------------------------------------------------------
// Admin handlers
// ---------------------------------------------------------------------------

/// GET /admin/orders
pub async fn list_all_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> AppResult<Json<Vec<OrderWithOwner>>> {
    let orders = OrderRepo::list_with_owner(&state.pool).await?;
    Ok(Json(orders))
}

/// POST /admin/orders/{id}/start
///
/// Pending -> Processing. Any other starting state is rejected.
pub async fn start_order(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
) -> AppResult<Json<Order>> {
    let moved = OrderRepo::start_processing(&state.pool, id).await?;
    if !moved {
        let order = OrderRepo::find_by_id(&state.pool, id)
            .await?
            .ok_or(AppError::Core(CoreError::NotFound {
                entity: "order",
                id,
            }))?;
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Order is {:?}, expected Pending",
            order.status
        ))));
    }

    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "order",
            id,
        }))?;
    Ok(Json(order))
}

/// POST /admin/complete/{id}
///
/// Multipart form with `ai_score`, `sim_score`, and optional `report1` /
/// `report2` files. Completion requires both scores and both report
/// paths; report files uploaded on an earlier failed attempt count.
pub async fn complete_order(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<DbId>,
    mut multipart: Multipart,
) -> AppResult<Json<Order>> {
    let order = OrderRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::NotFound {
            entity: "order",
            id,
        }))?;
    if order.status != OrderStatus::Processing {
        return Err(AppError::Core(CoreError::InvalidState(format!(
            "Order is {:?}, expected Processing",
            order.status
        ))));
    }

    let mut ai_raw = String::new();
    let mut sim_raw = String::new();
    let mut report1: Option<(String, Vec<u8>)> = None;
    let mut report2: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("ai_score") => {
                ai_raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read ai_score: {e}")))?;
            }
            Some("sim_score") => {
                sim_raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read sim_score: {e}")))?;
            }
            Some(name @ ("report1" | "report2")) => {
                let original = field
                    .file_name()
                    .map(sanitize_filename)
                    .filter(|n| !n.is_empty());
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::BadRequest(format!("Failed to read {name}: {e}"))
                })?;
                let slot = if name == "report1" {
                    &mut report1
                } else {
                    &mut report2
                };
                if let Some(original) = original {
                    if !bytes.is_empty() {
                        *slot = Some((original, bytes.to_vec()));
                    }
                }
            }
            _ => {}
        }
    }

    // Newly uploaded reports are stored and attached before score
    // validation, so a failed attempt still leaves them on the order for
    // the retry.
    let report1_path = store_report(&state, id, report1).await?;
    let report2_path = store_report(&state, id, report2).await?;
    let order = OrderRepo::attach_reports(
        &state.pool,
        id,
        report1_path.as_deref(),
        report2_path.as_deref(),
    )
    .await?
    .ok_or_else(|| {
        AppError::Core(CoreError::InvalidState(
            "Order left Processing while reports were being attached".into(),
        ))
    })?;

    let ai_score = parse_score("AI score", &ai_raw)?;
    let sim_score = parse_score("Similarity score", &sim_raw)?;

    if order.report1_path.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "Report 1 is required to complete an order".into(),
        )));
    }
    if order.report2_path.is_none() {
        return Err(AppError::Core(CoreError::Validation(
            "Report 2 is required to complete an order".into(),
        )));
    }

    let completed = OrderRepo::complete(&state.pool, id, ai_score, sim_score)
        .await?
        .ok_or_else(|| {
            AppError::Core(CoreError::InvalidState(
                "Order is no longer Processing".into(),
            ))
        })?;

    tracing::info!(order_id = id, ai_score, sim_score, "Order completed");
    Ok(Json(completed))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Keep only the final path component of a client-supplied filename.
fn sanitize_filename(name: &str) -> String {
    name.rsplit(['/', '\\']).next().unwrap_or(name).to_string()
}

/// Write an uploaded report under the report namespacing; `None` input
/// passes through.
async fn store_report(
    state: &AppState,
    order_id: DbId,
    file: Option<(String, Vec<u8>)>,
) -> AppResult<Option<String>> {
    let Some((original, bytes)) = file else {
        return Ok(None);
    };
    validate_upload_size(bytes.len())?;

    let stored_name = stored_report_name(order_id, Utc::now().timestamp(), &original);
    let stored_path = format!("{}/{stored_name}", state.config.upload_dir);

    tokio::fs::create_dir_all(&state.config.upload_dir)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to create upload dir: {e}")))?;
    tokio::fs::write(&stored_path, &bytes)
        .await
        .map_err(|e| AppError::InternalError(format!("Failed to store report: {e}")))?;

    Ok(Some(stored_path))
}

/// Best-effort removal of every file an order references.
pub(crate) async fn remove_order_files(order: &Order) {
    let mut paths = vec![order.stored_file_path.clone()];
    if let Some(p) = &order.report1_path {
        paths.push(p.clone());
    }
    if let Some(p) = &order.report2_path {
        paths.push(p.clone());
    }
    for path in paths {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            tracing::debug!(path, error = %e, "Could not remove order file");
        }
    }
}
