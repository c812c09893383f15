//! Database models

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::slip::SlipFormat;
use crate::{Error, Result};

/// Lifecycle of the printed trip sheet for a scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum TripSheetStatus {
    #[default]
    Generated,
    Printed,
    Given,
}

impl TripSheetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripSheetStatus::Generated => "generated",
            TripSheetStatus::Printed => "printed",
            TripSheetStatus::Given => "given",
        }
    }
}

impl std::str::FromStr for TripSheetStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "generated" => Ok(TripSheetStatus::Generated),
            "printed" => Ok(TripSheetStatus::Printed),
            "given" => Ok(TripSheetStatus::Given),
            other => Err(Error::InvalidInput(format!(
                "Unknown trip sheet status: {} (expected generated, printed or given)",
                other
            ))),
        }
    }
}

/// A persisted scan / trip sheet record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    #[sqlx(rename = "guid")]
    pub id: String,
    pub permit_no: String,
    pub lessee_id: String,
    pub dispatch_slip_no: String,
    pub mine_code: String,
    pub dispatch_date: String,
    /// Dispatch date as a sortable timestamp
    pub parsed_date: NaiveDateTime,
    pub distance: String,
    pub duration: String,
    pub mineral_qty: String,
    pub vehicle_no: String,
    pub district: String,
    pub raw: String,
    pub format: SlipFormat,
    pub vehicle_type: String,
    pub driver_name: String,
    pub driver_license: String,
    pub driver_phone: String,
    pub destination: String,
    pub delivered_to: String,
    pub order_ref: String,
    pub trip_sheet_status: TripSheetStatus,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub scanned_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
