//! Authenticated file downloads.
//!
//! Requests may use either the stored (namespaced) name or the original
//! client filename; the response advertises the original name via
//! Content-Disposition either way.

use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};

use checkmate_core::error::CoreError;
use checkmate_core::storage::display_name;
use std::io::ErrorKind;
use checkmate_db::repositories::OrderRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;

/// GET /download/{filename}
///
/// Admins may fetch any stored file. Everyone else must own an order
/// referencing the requested basename.
pub async fn download_file(
    State(state): State<AppState>,
    user: AuthUser,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    if filename.contains('/') || filename.contains('\\') || filename.contains("..") {
        return Err(AppError::BadRequest("Invalid filename".into()));
    }

    if !user.is_admin {
        let owns = OrderRepo::user_owns_file(&state.pool, user.user_id, &filename).await?;
        if !owns {
            return Err(AppError::Core(CoreError::Forbidden(
                "You do not have access to this file".into(),
            )));
        }
    }

    let path = format!("{}/{filename}", state.config.upload_dir);
    let (served_name, bytes) = match tokio::fs::read(&path).await {
        Ok(bytes) => (filename.clone(), bytes),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            // Clients may ask for the original name; fall back to the
            // newest stored file whose name ends with it.
            let scope = if user.is_admin { None } else { Some(user.user_id) };
            let stored = OrderRepo::resolve_stored_name(&state.pool, scope, &filename)
                .await?
                .ok_or_else(|| AppError::NotFound("File not found".into()))?;
            let path = format!("{}/{stored}", state.config.upload_dir);
            match tokio::fs::read(&path).await {
                Ok(bytes) => (stored, bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    return Err(AppError::NotFound("File not found".into()));
                }
                Err(e) => {
                    return Err(AppError::InternalError(format!("Failed to read file: {e}")));
                }
            }
        }
        Err(e) => {
            return Err(AppError::InternalError(format!("Failed to read file: {e}")));
        }
    };

    let disposition = format!("attachment; filename=\"{}\"", display_name(&served_name));
    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (header::CONTENT_DISPOSITION, disposition),
    ];

    Ok((headers, bytes).into_response())
}
