//! Driver registry endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Json, Router,
};
use dispatch_common::profile::Driver;
use serde_json::{json, Value};
use tracing::info;

use crate::db::drivers::{self, DriverInput};
use crate::{ApiJson, ApiResult, AppState};

/// GET /api/drivers
pub async fn list_drivers(State(state): State<AppState>) -> ApiResult<Json<Vec<Driver>>> {
    Ok(Json(drivers::list_drivers(&state.db).await?))
}

/// POST /api/drivers
pub async fn add_driver(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<DriverInput>,
) -> ApiResult<(StatusCode, Json<Driver>)> {
    let driver = drivers::add_driver(&state.db, &input).await?;
    info!(id = %driver.id, name = %driver.name, "Driver added");
    Ok((StatusCode::CREATED, Json(driver)))
}

/// PUT /api/drivers/:id
pub async fn update_driver(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<DriverInput>,
) -> ApiResult<Json<Driver>> {
    let driver = drivers::update_driver(&state.db, &id, &input).await?;
    info!(id = %id, "Driver updated");
    Ok(Json(driver))
}

/// DELETE /api/drivers/:id
pub async fn delete_driver(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    drivers::delete_driver(&state.db, &id).await?;
    info!(id = %id, "Driver deleted");
    Ok(Json(json!({ "deleted": true, "id": id })))
}

/// Build driver registry routes
pub fn driver_routes() -> Router<AppState> {
    Router::new()
        .route("/api/drivers", get(list_drivers).post(add_driver))
        .route("/api/drivers/:id", put(update_driver).delete(delete_driver))
}
