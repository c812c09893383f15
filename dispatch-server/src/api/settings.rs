//! Lessee profile and pick-list endpoints

use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use dispatch_common::profile::{Driver, ListKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::info;

use crate::db::{drivers, lists, settings};
use crate::{ApiJson, ApiResult, AppState};

/// Everything a client needs to fill its settings screen
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub profile: BTreeMap<String, String>,
    pub lists: BTreeMap<String, Vec<String>>,
    pub drivers: Vec<Driver>,
}

#[derive(Debug, Deserialize)]
pub struct ListItemRequest {
    pub item: String,
}

async fn load_settings(state: &AppState) -> ApiResult<SettingsResponse> {
    Ok(SettingsResponse {
        profile: settings::get_profile(&state.db).await?,
        lists: lists::get_all_lists(&state.db).await?,
        drivers: drivers::list_drivers(&state.db).await?,
    })
}

/// GET /api/settings
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<Json<SettingsResponse>> {
    Ok(Json(load_settings(&state).await?))
}

/// PUT /api/settings
///
/// **Request:** `{"hsnCode": "0002271", "taluk": "Gobichettipalayam"}`
/// **Response:** the merged profile
pub async fn update_profile(
    State(state): State<AppState>,
    ApiJson(values): ApiJson<BTreeMap<String, String>>,
) -> ApiResult<Json<BTreeMap<String, String>>> {
    settings::set_profile_values(&state.db, &values).await?;
    info!(keys = ?values.keys().collect::<Vec<_>>(), "Profile updated");
    Ok(Json(settings::get_profile(&state.db).await?))
}

/// POST /api/settings/reset
pub async fn reset_settings(State(state): State<AppState>) -> ApiResult<Json<SettingsResponse>> {
    settings::reset_profile(&state.db).await?;
    info!("Profile, pick lists and drivers reset to defaults");
    Ok(Json(load_settings(&state).await?))
}

/// GET /api/settings/lists/:list
pub async fn get_list(
    State(state): State<AppState>,
    Path(list): Path<String>,
) -> ApiResult<Json<Vec<String>>> {
    let kind: ListKind = list.parse()?;
    Ok(Json(lists::get_list(&state.db, kind).await?))
}

/// POST /api/settings/lists/:list
pub async fn add_list_item(
    State(state): State<AppState>,
    Path(list): Path<String>,
    ApiJson(request): ApiJson<ListItemRequest>,
) -> ApiResult<Json<Vec<String>>> {
    let kind: ListKind = list.parse()?;
    let items = lists::add_item(&state.db, kind, &request.item).await?;
    info!(list = kind.as_str(), item = %request.item.trim(), "List item added");
    Ok(Json(items))
}

/// DELETE /api/settings/lists/:list/:item
pub async fn remove_list_item(
    State(state): State<AppState>,
    Path((list, item)): Path<(String, String)>,
) -> ApiResult<Json<Vec<String>>> {
    let kind: ListKind = list.parse()?;
    let items = lists::remove_item(&state.db, kind, &item).await?;
    info!(list = kind.as_str(), item = %item, "List item removed");
    Ok(Json(items))
}

/// Build profile settings routes
pub fn settings_routes() -> Router<AppState> {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_profile))
        .route("/api/settings/reset", post(reset_settings))
        .route("/api/settings/lists/:list", get(get_list).post(add_list_item))
        .route("/api/settings/lists/:list/:item", delete(remove_list_item))
}
