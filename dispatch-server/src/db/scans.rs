//! Scan record persistence
//!
//! History listing, search, soft delete and bin retention queries.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use dispatch_common::db::{ScanRecord, TripSheetStatus};
use dispatch_common::{Error, Result};
use sqlx::{Executor, QueryBuilder, Sqlite, SqlitePool};

const SCAN_COLUMNS: &str = "guid, permit_no, lessee_id, dispatch_slip_no, mine_code, dispatch_date, \
    parsed_date, distance, duration, mineral_qty, vehicle_no, district, raw, format, vehicle_type, \
    driver_name, driver_license, driver_phone, destination, delivered_to, order_ref, \
    trip_sheet_status, is_deleted, deleted_at, scanned_at, updated_at";

/// Sortable history columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortField {
    #[default]
    ScannedAt,
    ParsedDate,
    PermitNo,
    VehicleNo,
}

impl SortField {
    fn column(&self) -> &'static str {
        match self {
            SortField::ScannedAt => "scanned_at",
            SortField::ParsedDate => "parsed_date",
            SortField::PermitNo => "permit_no",
            SortField::VehicleNo => "vehicle_no",
        }
    }
}

impl std::str::FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "scannedAt" => Ok(SortField::ScannedAt),
            "parsedDate" => Ok(SortField::ParsedDate),
            "permitNo" => Ok(SortField::PermitNo),
            "vehicleNo" => Ok(SortField::VehicleNo),
            other => Err(Error::InvalidInput(format!("Invalid sort field: {}", other))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(Error::InvalidInput(format!("Invalid sort order: {}", other))),
        }
    }
}

/// History query: active records only
#[derive(Debug, Clone, Default)]
pub struct ListFilter {
    /// Case-insensitive substring searched across vehicle, mineral, place and serial
    pub query: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
    /// Inclusive lower bound on the dispatch date
    pub from: Option<NaiveDateTime>,
    /// Exclusive upper bound on the dispatch date
    pub until: Option<NaiveDateTime>,
    pub limit: i64,
}

/// Escape LIKE wildcards so user text matches literally (ESCAPE '\')
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

/// Insert a fully-populated record
pub async fn insert_scan<'e, E>(executor: E, record: &ScanRecord) -> Result<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        r#"
        INSERT INTO scans (
            guid, permit_no, lessee_id, dispatch_slip_no, mine_code, dispatch_date,
            parsed_date, distance, duration, mineral_qty, vehicle_no, district, raw, format,
            vehicle_type, driver_name, driver_license, driver_phone, destination, delivered_to,
            order_ref, trip_sheet_status, is_deleted, deleted_at, scanned_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.permit_no)
    .bind(&record.lessee_id)
    .bind(&record.dispatch_slip_no)
    .bind(&record.mine_code)
    .bind(&record.dispatch_date)
    .bind(record.parsed_date)
    .bind(&record.distance)
    .bind(&record.duration)
    .bind(&record.mineral_qty)
    .bind(&record.vehicle_no)
    .bind(&record.district)
    .bind(&record.raw)
    .bind(record.format)
    .bind(&record.vehicle_type)
    .bind(&record.driver_name)
    .bind(&record.driver_license)
    .bind(&record.driver_phone)
    .bind(&record.destination)
    .bind(&record.delivered_to)
    .bind(&record.order_ref)
    .bind(record.trip_sheet_status)
    .bind(record.is_deleted)
    .bind(record.deleted_at)
    .bind(record.scanned_at)
    .bind(record.updated_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Insert many records atomically
pub async fn insert_scans(pool: &SqlitePool, records: &[ScanRecord]) -> Result<()> {
    let mut tx = pool.begin().await?;
    for record in records {
        insert_scan(&mut *tx, record).await?;
    }
    tx.commit().await?;
    Ok(())
}

pub async fn get_scan(pool: &SqlitePool, id: &str) -> Result<Option<ScanRecord>> {
    let record = sqlx::query_as::<_, ScanRecord>(&format!(
        "SELECT {} FROM scans WHERE guid = ?",
        SCAN_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Load a record or fail with `NotFound`
pub async fn require_scan(pool: &SqlitePool, id: &str) -> Result<ScanRecord> {
    get_scan(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Scan {}", id)))
}

/// Active (not binned) records matching the filter
pub async fn list_scans(pool: &SqlitePool, filter: &ListFilter) -> Result<Vec<ScanRecord>> {
    let mut qb: QueryBuilder<Sqlite> =
        QueryBuilder::new(format!("SELECT {} FROM scans WHERE is_deleted = 0", SCAN_COLUMNS));

    if let Some(q) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        let pattern = like_pattern(q);
        qb.push(" AND (");
        let mut first = true;
        for column in ["vehicle_no", "mineral_qty", "district", "destination", "permit_no"] {
            if !first {
                qb.push(" OR ");
            }
            first = false;
            qb.push(column)
                .push(" LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\'");
        }
        qb.push(")");
    }

    if let Some(from) = filter.from {
        qb.push(" AND parsed_date >= ").push_bind(from);
    }
    if let Some(until) = filter.until {
        qb.push(" AND parsed_date < ").push_bind(until);
    }

    let direction = match filter.order {
        SortOrder::Asc => "ASC",
        SortOrder::Desc => "DESC",
    };
    qb.push(format!(
        " ORDER BY {col} {dir}, rowid {dir} LIMIT ",
        col = filter.sort.column(),
        dir = direction
    ))
    .push_bind(filter.limit);

    let records = qb.build_query_as::<ScanRecord>().fetch_all(pool).await?;
    Ok(records)
}

/// Overwrite the editable columns of a record
pub async fn update_scan(pool: &SqlitePool, record: &ScanRecord) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE scans SET
            permit_no = ?, lessee_id = ?, dispatch_slip_no = ?, mine_code = ?,
            dispatch_date = ?, parsed_date = ?, distance = ?, duration = ?, mineral_qty = ?,
            vehicle_no = ?, district = ?, vehicle_type = ?, driver_name = ?, driver_license = ?,
            driver_phone = ?, destination = ?, delivered_to = ?, order_ref = ?,
            trip_sheet_status = ?, updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(&record.permit_no)
    .bind(&record.lessee_id)
    .bind(&record.dispatch_slip_no)
    .bind(&record.mine_code)
    .bind(&record.dispatch_date)
    .bind(record.parsed_date)
    .bind(&record.distance)
    .bind(&record.duration)
    .bind(&record.mineral_qty)
    .bind(&record.vehicle_no)
    .bind(&record.district)
    .bind(&record.vehicle_type)
    .bind(&record.driver_name)
    .bind(&record.driver_license)
    .bind(&record.driver_phone)
    .bind(&record.destination)
    .bind(&record.delivered_to)
    .bind(&record.order_ref)
    .bind(record.trip_sheet_status)
    .bind(record.updated_at)
    .bind(&record.id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Scan {}", record.id)));
    }
    Ok(())
}

pub async fn set_status(
    pool: &SqlitePool,
    id: &str,
    status: TripSheetStatus,
    now: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE scans SET trip_sheet_status = ?, updated_at = ? WHERE guid = ?"
    )
    .bind(status)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Scan {}", id)));
    }
    Ok(())
}

/// Move a record to the recycle bin. Re-binning keeps the original deletion time.
pub async fn soft_delete(pool: &SqlitePool, id: &str, now: DateTime<Utc>) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE scans
        SET deleted_at = CASE WHEN is_deleted = 1 THEN deleted_at ELSE ? END,
            is_deleted = 1,
            updated_at = ?
        WHERE guid = ?
        "#,
    )
    .bind(now)
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound(format!("Scan {}", id)));
    }
    Ok(())
}

pub async fn restore(pool: &SqlitePool, id: &str, now: DateTime<Utc>) -> Result<()> {
    let record = require_scan(pool, id).await?;
    if !record.is_deleted {
        return Err(Error::Conflict(format!("Scan {} is not in the recycle bin", id)));
    }

    sqlx::query(
        "UPDATE scans SET is_deleted = 0, deleted_at = NULL, updated_at = ? WHERE guid = ?"
    )
    .bind(now)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Permanently remove a binned record
pub async fn hard_delete(pool: &SqlitePool, id: &str) -> Result<()> {
    let record = require_scan(pool, id).await?;
    if !record.is_deleted {
        return Err(Error::Conflict(format!(
            "Scan {} must be moved to the recycle bin before permanent deletion",
            id
        )));
    }

    sqlx::query("DELETE FROM scans WHERE guid = ? AND is_deleted = 1")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Binned records, most recently deleted first
pub async fn list_bin(pool: &SqlitePool, limit: i64) -> Result<Vec<ScanRecord>> {
    let records = sqlx::query_as::<_, ScanRecord>(&format!(
        "SELECT {} FROM scans WHERE is_deleted = 1 ORDER BY deleted_at DESC, rowid DESC LIMIT ?",
        SCAN_COLUMNS
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Permanently remove binned records deleted more than `retention_days` before `now`.
///
/// Returns the number of records removed.
pub async fn purge_expired(pool: &SqlitePool, retention_days: i64, now: DateTime<Utc>) -> Result<u64> {
    let cutoff = Duration::try_days(retention_days)
        .and_then(|retention| now.checked_sub_signed(retention))
        .ok_or_else(|| Error::Config(format!("bin retention of {} days is out of range", retention_days)))?;
    let result = sqlx::query("DELETE FROM scans WHERE is_deleted = 1 AND deleted_at < ?")
        .bind(cutoff)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        dispatch_common::db::create_schema(&pool).await.unwrap();
        pool
    }

    #[tokio::test]
    async fn test_purge_rejects_unrepresentable_retention() {
        let pool = setup_test_db().await;

        let result = purge_expired(&pool, 200_000_000_000, Utc::now()).await;
        assert!(matches!(result, Err(Error::Config(_))));

        assert_eq!(purge_expired(&pool, 30, Utc::now()).await.unwrap(), 0);
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("TN36"), "%TN36%");
        assert_eq!(like_pattern("50%"), "%50\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
        assert_eq!(like_pattern("c:\\x"), "%c:\\\\x%");
    }

    #[test]
    fn test_sort_field_parse() {
        assert_eq!("parsedDate".parse::<SortField>().unwrap(), SortField::ParsedDate);
        assert!("guid; DROP TABLE scans".parse::<SortField>().is_err());
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!("ASC".parse::<SortOrder>().unwrap(), SortOrder::Asc);
        assert_eq!("desc".parse::<SortOrder>().unwrap(), SortOrder::Desc);
        assert!("sideways".parse::<SortOrder>().is_err());
    }
}
