//! Recycle bin endpoints
//!
//! Soft delete moves a record out of the history into the bin; restore moves
//! it back. Permanent deletion is only possible from the bin.

use axum::{
    extract::{Path, State},
    routing::{delete, get, put},
    Json, Router,
};
use dispatch_common::db::ScanRecord;
use dispatch_common::time;
use serde::Serialize;
use tracing::info;

use crate::db::scans;
use crate::{ApiResult, AppState};

/// Outcome of a permanent delete
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub deleted: bool,
    pub id: String,
}

/// PUT /api/scans/:id/delete
pub async fn move_to_bin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanRecord>> {
    scans::soft_delete(&state.db, &id, time::now()).await?;
    info!(id = %id, "Scan moved to recycle bin");
    Ok(Json(scans::require_scan(&state.db, &id).await?))
}

/// PUT /api/scans/:id/restore
pub async fn restore_from_bin(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanRecord>> {
    scans::restore(&state.db, &id, time::now()).await?;
    info!(id = %id, "Scan restored from recycle bin");
    Ok(Json(scans::require_scan(&state.db, &id).await?))
}

/// DELETE /api/scans/:id
pub async fn delete_permanently(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    scans::hard_delete(&state.db, &id).await?;
    info!(id = %id, "Scan permanently deleted");
    Ok(Json(DeleteResponse { deleted: true, id }))
}

/// GET /api/bin
///
/// Expired entries are purged first so the listing never shows records past
/// the retention window.
pub async fn list_bin(State(state): State<AppState>) -> ApiResult<Json<Vec<ScanRecord>>> {
    let purged = scans::purge_expired(&state.db, state.settings.bin_retention_days, time::now()).await?;
    if purged > 0 {
        info!(purged, "Purged expired recycle bin entries");
    }

    let records = scans::list_bin(&state.db, state.settings.list_limit).await?;
    Ok(Json(records))
}

/// Build recycle bin routes
pub fn bin_routes() -> Router<AppState> {
    Router::new()
        .route("/api/scans/:id/delete", put(move_to_bin))
        .route("/api/scans/:id/restore", put(restore_from_bin))
        .route("/api/scans/:id", delete(delete_permanently))
        .route("/api/bin", get(list_bin))
}
