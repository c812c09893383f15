//! Bulk trip-sheet generation
//!
//! One template record is copied `count` times with consecutive serial
//! numbers, all inserted in a single transaction.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use dispatch_common::db::{ScanRecord, TripSheetStatus};
use dispatch_common::serial::generate_serials;
use dispatch_common::time;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::scans::ScanFields;
use crate::db::scans;
use crate::{ApiError, ApiJson, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkRequest {
    pub start_serial_no: Option<String>,
    pub count: Option<i64>,
    #[serde(default)]
    pub template_data: ScanFields,
}

#[derive(Debug, Serialize)]
pub struct BulkResponse {
    pub count: usize,
    pub serials: Vec<String>,
    pub records: Vec<ScanRecord>,
}

/// Replace the first comma-separated field of a payload
pub fn replace_first_field(raw: &str, serial: &str) -> String {
    match raw.split_once(',') {
        Some((_, rest)) => format!("{},{}", serial, rest),
        None => serial.to_string(),
    }
}

/// Records for each serial, copied from the template
pub fn build_bulk_records(template: &ScanFields, serials: &[String]) -> ApiResult<Vec<ScanRecord>> {
    let scanned_at = time::now();
    let local_now = time::local_now();

    serials
        .iter()
        .map(|serial| {
            let mut fields = template.clone();
            fields.permit_no = Some(serial.clone());
            fields.raw = template
                .raw
                .as_deref()
                .filter(|raw| !raw.trim().is_empty())
                .map(|raw| replace_first_field(raw, serial));
            fields.trip_sheet_status = Some(TripSheetStatus::Generated);
            fields.to_record(scanned_at, local_now)
        })
        .collect()
}

/// POST /api/scans/bulk
pub async fn bulk_generate(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<BulkRequest>,
) -> ApiResult<(StatusCode, Json<BulkResponse>)> {
    let start = request
        .start_serial_no
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| ApiError::BadRequest("startSerialNo is required".to_string()))?;
    let count = request
        .count
        .ok_or_else(|| ApiError::BadRequest("count is required".to_string()))?;
    let count = u32::try_from(count)
        .map_err(|_| ApiError::BadRequest(format!("count out of range: {}", count)))?;

    let serials = generate_serials(start, count)?;
    let records = build_bulk_records(&request.template_data, &serials)?;
    scans::insert_scans(&state.db, &records).await?;

    info!(
        count = records.len(),
        first = %serials.first().map(String::as_str).unwrap_or_default(),
        last = %serials.last().map(String::as_str).unwrap_or_default(),
        "Bulk trip sheets generated"
    );

    Ok((
        StatusCode::CREATED,
        Json(BulkResponse {
            count: records.len(),
            serials,
            records,
        }),
    ))
}

/// Build bulk generation routes
pub fn bulk_routes() -> Router<AppState> {
    Router::new().route("/api/scans/bulk", post(bulk_generate))
}
