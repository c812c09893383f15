//! Scan record endpoints
//!
//! Create (from structured fields or a raw QR payload), parse preview,
//! history listing with search, single-record read, edit and status changes.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use dispatch_common::db::{ScanRecord, TripSheetStatus};
use dispatch_common::slip::{
    format_dispatch_date, parse_dispatch_date, parse_qr_data_at, split_mineral_qty, NOT_AVAILABLE,
};
use dispatch_common::{time, DispatchSlip, SlipFormat};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::scans::{self, ListFilter, SortField, SortOrder};
use crate::{ApiError, ApiJson, ApiResult, AppState};

/// Record fields accepted on create, edit and as bulk template data
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanFields {
    pub permit_no: Option<String>,
    pub lessee_id: Option<String>,
    pub dispatch_slip_no: Option<String>,
    pub mine_code: Option<String>,
    pub dispatch_date: Option<String>,
    pub distance: Option<String>,
    pub duration: Option<String>,
    pub mineral_qty: Option<String>,
    pub vehicle_no: Option<String>,
    pub district: Option<String>,
    pub raw: Option<String>,
    pub format: Option<SlipFormat>,
    pub vehicle_type: Option<String>,
    pub driver_name: Option<String>,
    pub driver_license: Option<String>,
    pub driver_phone: Option<String>,
    pub destination: Option<String>,
    pub delivered_to: Option<String>,
    pub order_ref: Option<String>,
    pub trip_sheet_status: Option<TripSheetStatus>,
}

/// Trimmed, non-empty value
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Slip fields fall back to the missing-field marker when cleared
fn set_slip_field(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        let v = v.trim();
        *target = if v.is_empty() { NOT_AVAILABLE.to_string() } else { v.to_string() };
    }
}

fn set_text_field(target: &mut String, value: &Option<String>) {
    if let Some(v) = value {
        *target = v.trim().to_string();
    }
}

impl ScanFields {
    /// Slip built from `raw` (when present) with structured fields laid over it.
    ///
    /// An unparseable `raw` is an error only when there is no `permitNo` to
    /// fall back on.
    pub fn to_slip(&self, local_now: NaiveDateTime) -> ApiResult<DispatchSlip> {
        let has_permit = present(&self.permit_no).is_some();

        let parsed = match present(&self.raw) {
            Some(_) => {
                let raw = self.raw.as_deref().unwrap_or_default();
                match parse_qr_data_at(raw, local_now) {
                    Ok(slip) => Some(slip),
                    Err(e) if !has_permit => return Err(e.into()),
                    Err(e) => {
                        debug!("Ignoring unparseable raw payload: {}", e);
                        None
                    }
                }
            }
            None if !has_permit => {
                return Err(ApiError::BadRequest(
                    "Either permitNo or raw is required".to_string(),
                ))
            }
            None => None,
        };

        let mut slip = parsed.unwrap_or_else(|| {
            let na = || NOT_AVAILABLE.to_string();
            DispatchSlip {
                permit_no: na(),
                lessee_id: String::new(),
                dispatch_slip_no: na(),
                mine_code: na(),
                dispatch_date: format_dispatch_date(&local_now),
                distance: na(),
                duration: na(),
                mineral_qty: na(),
                vehicle_no: na(),
                district: na(),
                raw: self.raw.clone().unwrap_or_default(),
                format: SlipFormat::Legacy,
            }
        });

        set_slip_field(&mut slip.permit_no, &self.permit_no);
        set_text_field(&mut slip.lessee_id, &self.lessee_id);
        set_slip_field(&mut slip.dispatch_slip_no, &self.dispatch_slip_no);
        set_slip_field(&mut slip.mine_code, &self.mine_code);
        if let Some(date) = present(&self.dispatch_date) {
            slip.dispatch_date = date.to_string();
        }
        set_slip_field(&mut slip.distance, &self.distance);
        set_slip_field(&mut slip.duration, &self.duration);
        set_slip_field(&mut slip.mineral_qty, &self.mineral_qty);
        set_slip_field(&mut slip.vehicle_no, &self.vehicle_no);
        set_slip_field(&mut slip.district, &self.district);
        if let Some(format) = self.format {
            slip.format = format;
        }

        Ok(slip)
    }

    /// New record with a fresh id, stamped `scanned_at`
    pub fn to_record(&self, scanned_at: DateTime<Utc>, local_now: NaiveDateTime) -> ApiResult<ScanRecord> {
        let slip = self.to_slip(local_now)?;
        let parsed_date = parse_dispatch_date(&slip.dispatch_date).unwrap_or(local_now);

        let mut record = ScanRecord {
            id: Uuid::new_v4().to_string(),
            permit_no: slip.permit_no,
            lessee_id: slip.lessee_id,
            dispatch_slip_no: slip.dispatch_slip_no,
            mine_code: slip.mine_code,
            dispatch_date: slip.dispatch_date,
            parsed_date,
            distance: slip.distance,
            duration: slip.duration,
            mineral_qty: slip.mineral_qty,
            vehicle_no: slip.vehicle_no,
            district: slip.district,
            raw: slip.raw,
            format: slip.format,
            vehicle_type: String::new(),
            driver_name: String::new(),
            driver_license: String::new(),
            driver_phone: String::new(),
            destination: String::new(),
            delivered_to: String::new(),
            order_ref: String::new(),
            trip_sheet_status: self.trip_sheet_status.unwrap_or_default(),
            is_deleted: false,
            deleted_at: None,
            scanned_at,
            updated_at: scanned_at,
        };
        self.apply_trip_fields(&mut record);
        Ok(record)
    }

    /// Driver and delivery details, which have no place in the QR payload
    fn apply_trip_fields(&self, record: &mut ScanRecord) {
        set_text_field(&mut record.vehicle_type, &self.vehicle_type);
        set_text_field(&mut record.driver_name, &self.driver_name);
        set_text_field(&mut record.driver_license, &self.driver_license);
        set_text_field(&mut record.driver_phone, &self.driver_phone);
        set_text_field(&mut record.destination, &self.destination);
        set_text_field(&mut record.delivered_to, &self.delivered_to);
        set_text_field(&mut record.order_ref, &self.order_ref);
    }

    /// Apply an edit to a stored record. `raw` and `format` are immutable.
    pub fn apply_edit(&self, record: &mut ScanRecord, now: DateTime<Utc>) {
        set_slip_field(&mut record.permit_no, &self.permit_no);
        set_text_field(&mut record.lessee_id, &self.lessee_id);
        set_slip_field(&mut record.dispatch_slip_no, &self.dispatch_slip_no);
        set_slip_field(&mut record.mine_code, &self.mine_code);
        set_slip_field(&mut record.distance, &self.distance);
        set_slip_field(&mut record.duration, &self.duration);
        set_slip_field(&mut record.mineral_qty, &self.mineral_qty);
        set_slip_field(&mut record.vehicle_no, &self.vehicle_no);
        set_slip_field(&mut record.district, &self.district);

        if let Some(date) = present(&self.dispatch_date) {
            if date != record.dispatch_date {
                record.dispatch_date = date.to_string();
                record.parsed_date = parse_dispatch_date(date)
                    .unwrap_or_else(|| record.scanned_at.with_timezone(&Local).naive_local());
            }
        }

        if let Some(status) = self.trip_sheet_status {
            record.trip_sheet_status = status;
        }
        self.apply_trip_fields(record);
        record.updated_at = now;
    }
}

/// POST /api/scans
pub async fn create_scan(
    State(state): State<AppState>,
    ApiJson(fields): ApiJson<ScanFields>,
) -> ApiResult<(StatusCode, Json<ScanRecord>)> {
    let record = fields.to_record(time::now(), time::local_now())?;
    scans::insert_scan(&state.db, &record).await?;

    info!(id = %record.id, permit_no = %record.permit_no, "Scan saved");
    Ok((StatusCode::CREATED, Json(record)))
}

#[derive(Debug, Deserialize)]
pub struct ParseRequest {
    pub raw: String,
}

/// Parsed slip plus the derived values a client shows before saving
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseResponse {
    #[serde(flatten)]
    pub slip: DispatchSlip,
    pub mineral: String,
    pub quantity: String,
    /// `None` when the dispatch date is not in `DD-MM-YYYY HH:MM` form
    pub parsed_date: Option<NaiveDateTime>,
}

/// POST /api/scans/parse
pub async fn parse_scan(ApiJson(request): ApiJson<ParseRequest>) -> ApiResult<Json<ParseResponse>> {
    let slip = parse_qr_data_at(&request.raw, time::local_now())?;
    let mineral = split_mineral_qty(&slip.mineral_qty);
    let parsed_date = parse_dispatch_date(&slip.dispatch_date);

    Ok(Json(ParseResponse {
        slip,
        mineral: mineral.name,
        quantity: mineral.qty,
        parsed_date,
    }))
}

/// History query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub q: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
    /// `YYYY-MM-DD`, inclusive
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive of the whole day
    pub end_date: Option<String>,
    /// Clamped to `1..=list_limit` (100 unless configured otherwise)
    pub limit: Option<i64>,
}

fn parse_day(name: &str, value: &Option<String>) -> ApiResult<Option<NaiveDate>> {
    match present(value) {
        None => Ok(None),
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| ApiError::BadRequest(format!("{} must be YYYY-MM-DD, got {}", name, text))),
    }
}

impl ListQuery {
    /// Validated filter with `limit` clamped to `1..=max_limit`
    pub fn to_filter(&self, max_limit: i64) -> ApiResult<ListFilter> {
        let sort = match present(&self.sort) {
            Some(s) => s.parse::<SortField>()?,
            None => SortField::default(),
        };
        let order = match present(&self.order) {
            Some(o) => o.parse::<SortOrder>()?,
            None => SortOrder::default(),
        };

        let from = parse_day("startDate", &self.start_date)?.and_then(|d| d.and_hms_opt(0, 0, 0));
        let until = match parse_day("endDate", &self.end_date)? {
            Some(day) => Some(
                day.succ_opt()
                    .and_then(|next| next.and_hms_opt(0, 0, 0))
                    .ok_or_else(|| ApiError::BadRequest(format!("endDate out of range: {}", day)))?,
            ),
            None => None,
        };

        Ok(ListFilter {
            query: present(&self.q).map(str::to_string),
            sort,
            order,
            from,
            until,
            limit: self.limit.unwrap_or(max_limit).clamp(1, max_limit.max(1)),
        })
    }
}

/// GET /api/scans
pub async fn list_scans(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Vec<ScanRecord>>> {
    let filter = query.to_filter(state.settings.list_limit)?;
    let records = scans::list_scans(&state.db, &filter).await?;
    Ok(Json(records))
}

/// GET /api/scans/:id
pub async fn get_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ScanRecord>> {
    Ok(Json(scans::require_scan(&state.db, &id).await?))
}

/// PUT /api/scans/:id
pub async fn update_scan(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(fields): ApiJson<ScanFields>,
) -> ApiResult<Json<ScanRecord>> {
    let mut record = scans::require_scan(&state.db, &id).await?;
    if record.is_deleted {
        return Err(ApiError::Conflict(format!(
            "Scan {} is in the recycle bin; restore it before editing",
            id
        )));
    }

    fields.apply_edit(&mut record, time::now());
    scans::update_scan(&state.db, &record).await?;

    info!(id = %id, "Scan updated");
    Ok(Json(record))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

/// PUT /api/scans/:id/status
pub async fn set_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<StatusRequest>,
) -> ApiResult<Json<ScanRecord>> {
    let status: TripSheetStatus = request.status.trim().parse()?;
    scans::set_status(&state.db, &id, status, time::now()).await?;

    info!(id = %id, status = status.as_str(), "Trip sheet status changed");
    Ok(Json(scans::require_scan(&state.db, &id).await?))
}

/// Build scan record routes
pub fn scan_routes() -> Router<AppState> {
    Router::new()
        .route("/api/scans", post(create_scan).get(list_scans))
        .route("/api/scans/parse", post(parse_scan))
        .route("/api/scans/:id", get(get_scan).put(update_scan))
        .route("/api/scans/:id/status", put(set_status))
}
